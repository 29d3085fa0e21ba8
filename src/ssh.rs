use log::{debug, info, warn};
use regex::Regex;
use secrecy::ExposeSecret;

use crate::DeviceKind;
use crate::credentials::Credentials;
use crate::error::Error;
use crate::generic::connection::{Shell, SshShell};
use crate::generic::device::DeviceConnection;
use crate::vendor::{Dialect, DialectProfile};

pub const DEFAULT_SSH_PORT: u16 = 22;

/// CLI device reached over an interactive SSH session.
pub struct SshConnection<S: Shell = SshShell> {
    host: String,
    port: u16,
    credentials: Credentials,
    dialect: Dialect,
    prompt: Regex,
    privileged: Option<Regex>,
    escalation: Regex,
    password_prompt: Regex,
    shell: Option<S>,
}

impl SshConnection {
    pub fn new(host: impl Into<String>, credentials: Credentials, dialect: Dialect) -> Self {
        Self::with_shell(host, credentials, dialect)
    }
}

impl<S: Shell> SshConnection<S> {
    /// Builds a connection that opens sessions through the shell type `S`.
    pub fn with_shell(host: impl Into<String>, credentials: Credentials, dialect: Dialect) -> Self {
        let profile = dialect.profile();
        let password_prompt = r"(?i)password:\s*$";

        SshConnection {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            credentials,
            dialect,
            prompt: Regex::new(profile.prompt).expect("Invalid prompt regex"),
            privileged: profile
                .privileged
                .map(|p| Regex::new(p).expect("Invalid prompt regex")),
            escalation: Regex::new(&format!("{}|{}", password_prompt, profile.prompt))
                .expect("Invalid prompt regex"),
            password_prompt: Regex::new(password_prompt).expect("Invalid prompt regex"),
            shell: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn profile(&self) -> &'static DialectProfile {
        self.dialect.profile()
    }

    fn is_privileged(&self, output: &str) -> bool {
        self.privileged.as_ref().is_some_and(|re| re.is_match(output))
    }

    fn escalate(&self, shell: &mut S, secret: &str) -> Result<(), Error> {
        let profile = self.profile();

        let mut output = shell.execute(profile.escalate, &self.escalation)?;
        if self.password_prompt.is_match(&output) {
            output = shell.execute_secret(secret, &self.prompt)?;
        }

        let escalated = match &self.privileged {
            Some(re) => re.is_match(&output),
            None => !self.rejected(profile.escalate, &output) && !output.contains("Error:"),
        };
        if !escalated {
            return Err(Error::EnableFailed);
        }

        debug!("Entered privileged mode on {}", self.host);
        Ok(())
    }

    /// Whether the device refused `command`: the marker leads the first line
    /// printed after the echo, optionally below a `^` pointer line.
    fn rejected(&self, command: &str, output: &str) -> bool {
        let mut lines = output.lines().map(str::trim).filter(|line| !line.is_empty());

        let mut first = lines.next();
        if first == Some(command.trim()) {
            first = lines.next();
        }
        if first == Some("^") {
            first = lines.next();
        }

        first.is_some_and(|line| line.starts_with(self.profile().invalid_input))
    }

    /// Drops the echoed command line and the trailing prompt.
    fn clean_output(&self, command: &str, output: &str) -> String {
        let mut lines: Vec<&str> = output.lines().collect();

        if lines.first().is_some_and(|line| line.trim() == command.trim()) {
            lines.remove(0);
        }
        if lines.last().is_some_and(|line| self.prompt.is_match(line)) {
            lines.pop();
        }

        lines.join("\n")
    }
}

impl<S: Shell> DeviceConnection for SshConnection<S> {
    fn connect(&mut self) -> Result<(), Error> {
        if self.shell.is_some() {
            return Ok(());
        }

        let profile = self.profile();
        let mut shell = S::open(&self.host, self.port, &self.credentials, profile.encoding)?;

        let banner = shell.read(&self.prompt)?;
        if let Some(secret) = self.credentials.enable_secret() {
            if !self.is_privileged(&banner) {
                self.escalate(&mut shell, secret.expose_secret())?;
            }
        }

        let output = shell.execute(profile.disable_paging, &self.prompt)?;
        if self.rejected(profile.disable_paging, &output) {
            warn!("{} rejected '{}'", self.host, profile.disable_paging);
        }

        info!("Connected to {} ({})", self.host, self.dialect);
        self.shell = Some(shell);

        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Error> {
        if let Some(mut shell) = self.shell.take() {
            shell.close()?;
            info!("Disconnected from {}", self.host);
        }

        Ok(())
    }

    fn execute_command(&mut self, command: &str) -> Result<String, Error> {
        let shell = self
            .shell
            .as_mut()
            .ok_or_else(|| Error::NotConnected(self.host.clone()))?;

        let output = shell.execute(command, &self.prompt)?;

        if self.rejected(command, &output) {
            return Err(Error::CommandExecution(command.to_string()));
        }

        Ok(self.clean_output(command, &output))
    }

    fn is_connected(&self) -> bool {
        self.shell.is_some()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Ssh
    }

    fn host(&self) -> &str {
        &self.host
    }
}
