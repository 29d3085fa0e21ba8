use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed for user {user}")]
    AuthenticationFailed { user: String },

    #[error("Failed to enter privileged mode")]
    EnableFailed,

    #[error("Failed to execute command: {0}")]
    CommandExecution(String),

    #[error("Not connected to {0}")]
    NotConnected(String),

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Unsupported device type: {0}")]
    UnsupportedType(String),

    #[error("Unsupported device dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Invalid config file: {0}")]
    Config(#[from] serde_yaml::Error),
}
