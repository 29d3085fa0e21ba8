//! Pushing files to IOS devices over SCP.
//!
//! The device's SCP server is switched on through the CLI, the file is
//! copied by a [`FileTransfer`], and the server is switched off again.

use std::fs::File;
use std::io;
use std::path::Path;

use log::{info, warn};

use crate::credentials::Credentials;
use crate::error::Error;
use crate::generic::config::ConfigurationMode;
use crate::generic::connection::SshShell;
use crate::generic::device::DeviceConnection;
use crate::ssh::DEFAULT_SSH_PORT;

const SCP_SERVER_LINE: &str = "ip scp server enable";

/// Copies a local file to a path on a device.
pub trait FileTransfer {
    /// Returns the number of bytes sent.
    fn push(&mut self, local: &Path, remote: &str) -> Result<u64, Error>;
}

/// [`FileTransfer`] over its own ssh2 session.
pub struct ScpTransfer {
    host: String,
    port: u16,
    credentials: Credentials,
}

impl ScpTransfer {
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        ScpTransfer {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            credentials,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl FileTransfer for ScpTransfer {
    fn push(&mut self, local: &Path, remote: &str) -> Result<u64, Error> {
        let mut file = File::open(local)?;
        let size = file.metadata()?.len();

        let sess = SshShell::establish_session(&self.host, self.port, &self.credentials)?;
        let mut channel = sess.scp_send(Path::new(remote), 0o644, size, None)?;

        let sent = io::copy(&mut file, &mut channel)?;
        channel.send_eof()?;
        channel.wait_eof()?;
        channel.close()?;
        channel.wait_close()?;

        info!("Copied {} ({} bytes) to {}:{}", local.display(), sent, self.host, remote);
        Ok(sent)
    }
}

/// Turns the device's SCP server on or off and reports whether it is
/// enabled afterwards.
pub fn set_scp_server(conn: &mut dyn DeviceConnection, enabled: bool) -> Result<bool, Error> {
    {
        let mut config = ConfigurationMode::enter(&mut *conn)?;
        if enabled {
            config.execute(SCP_SERVER_LINE)?;
        } else {
            config.execute(&format!("no {SCP_SERVER_LINE}"))?;
        }
    }

    let output =
        conn.execute_command(&format!("show running-config | include {SCP_SERVER_LINE}"))?;

    Ok(output.lines().any(|line| line.trim() == SCP_SERVER_LINE))
}

/// Enables SCP on the device, pushes `local` to `remote`, then disables SCP
/// again. The disable step runs whether or not the transfer succeeded.
pub fn push_file(
    conn: &mut dyn DeviceConnection,
    transfer: &mut dyn FileTransfer,
    local: &Path,
    remote: &str,
) -> Result<u64, Error> {
    if !set_scp_server(conn, true)? {
        return Err(Error::CommandExecution(SCP_SERVER_LINE.to_string()));
    }

    let result = transfer.push(local, remote);

    match set_scp_server(conn, false) {
        Ok(false) => {}
        Ok(true) => warn!("SCP server still enabled on {}", conn.host()),
        Err(e) => warn!("Failed to disable SCP server on {}: {}", conn.host(), e),
    }

    result
}
