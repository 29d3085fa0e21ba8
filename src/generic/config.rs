use log::warn;

use super::device::DeviceConnection;
use crate::error::Error;

/// Configuration-mode scope on a CLI device.
///
/// Entering sends `configure terminal`; dropping the guard sends `end`.
pub struct ConfigurationMode<'a> {
    session: &'a mut dyn DeviceConnection,
}

impl<'a> ConfigurationMode<'a> {
    pub fn enter(session: &'a mut dyn DeviceConnection) -> Result<Self, Error> {
        session.execute_command("configure terminal")?;

        Ok(ConfigurationMode { session })
    }

    pub fn execute(&mut self, command: &str) -> Result<String, Error> {
        self.session.execute_command(command)
    }
}

impl Drop for ConfigurationMode<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.session.execute_command("end") {
            warn!("Failed to leave configuration mode on {}: {}", self.session.host(), e);
        }
    }
}
