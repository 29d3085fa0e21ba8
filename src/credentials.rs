use secrecy::SecretString;

/// Login material for one device.
///
/// Immutable once built; each connection owns its own copy.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
    enable_secret: Option<SecretString>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            enable_secret: None,
        }
    }

    pub fn with_enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Privilege escalation secret, if the device needs one after login.
    pub fn enable_secret(&self) -> Option<&SecretString> {
        self.enable_secret.as_ref()
    }
}
