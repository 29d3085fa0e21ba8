//! Device inventory loaded from YAML.
//!
//! ```yaml
//! devices:
//!   - name: core-sw1
//!     type: ssh
//!     host: 10.0.0.1
//!     username: admin
//!     password: secret
//!     enable_secret: enable123
//!     device_type: cisco_ios
//!   - name: dnac
//!     type: dnac
//!     host: dnac.example.com
//!     username: admin
//!     password: secret
//!     verify_tls: false
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{info, warn};
use serde::Deserialize;

use crate::{ConnectOptions, DeviceKind, create_connection};
use crate::credentials::Credentials;
use crate::error::Error;
use crate::generic::device::DeviceConnection;
use crate::manager::NetworkManager;
use crate::ssh::DEFAULT_SSH_PORT;
use crate::vendor::Dialect;

#[derive(Debug, Default, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,
}

/// One device entry of the inventory.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    /// `ssh`, `ise` or `dnac`.
    #[serde(rename = "type")]
    pub kind: String,
    pub host: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub enable_secret: Option<String>,
    /// CLI dialect of an SSH device; `cisco_ios` when absent.
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    /// Controller server root replacing `https://{host}`.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_verify_tls() -> bool {
    true
}

impl Inventory {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;

        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_str(text)?)
    }

    /// Builds every entry and registers it under its name. Entries with an
    /// unknown type or dialect are skipped with a warning.
    ///
    /// Returns the names that were registered.
    pub fn populate(&self, manager: &mut NetworkManager) -> Vec<String> {
        let mut registered = Vec::new();

        for spec in &self.devices {
            match spec.build() {
                Ok(connection) => {
                    manager.add_device(spec.name.clone(), connection);
                    info!("Initialized device: {}", spec.name);
                    registered.push(spec.name.clone());
                }
                Err(e) => warn!("Skipping device {}: {}", spec.name, e),
            }
        }

        registered
    }
}

impl DeviceSpec {
    pub fn credentials(&self) -> Credentials {
        let creds = Credentials::new(&self.username, &self.password);

        match &self.enable_secret {
            Some(secret) => creds.with_enable_secret(secret),
            None => creds,
        }
    }

    pub fn kind(&self) -> Result<DeviceKind, Error> {
        DeviceKind::from_str(&self.kind).map_err(|_| Error::UnsupportedType(self.kind.clone()))
    }

    pub fn dialect(&self) -> Result<Dialect, Error> {
        match &self.device_type {
            None => Ok(Dialect::default()),
            Some(name) => {
                Dialect::from_str(name).map_err(|_| Error::UnsupportedDialect(name.clone()))
            }
        }
    }

    /// Constructs the (still disconnected) connection this entry describes.
    pub fn build(&self) -> Result<Box<dyn DeviceConnection>, Error> {
        let kind = self.kind()?;
        let options = ConnectOptions {
            dialect: self.dialect()?,
            port: self.port.unwrap_or(DEFAULT_SSH_PORT),
            server: self.base_url.clone(),
            verify_tls: self.verify_tls,
        };

        Ok(create_connection(kind, &self.host, self.credentials(), &options))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    const INVENTORY: &str = r#"
devices:
  - name: core-sw1
    type: ssh
    host: 10.0.0.1
    username: admin
    password: secret
    enable_secret: enable123
  - name: edge-nx
    type: ssh
    host: 10.0.0.2
    username: admin
    password: secret
    device_type: cisco_nxos
    port: 2222
  - name: ise
    type: ise
    host: ise.example.com
    username: admin
    password: secret
  - name: dnac
    type: dnac
    host: dnac.example.com
    username: admin
    password: secret
    verify_tls: false
  - name: firewall
    type: telnet
    host: 10.0.0.3
    username: admin
    password: secret
  - name: junos
    type: ssh
    host: 10.0.0.4
    username: admin
    password: secret
    device_type: juniper_junos
"#;

    #[test]
    fn parses_entries_with_defaults() -> anyhow::Result<()> {
        let inventory = Inventory::from_yaml(INVENTORY)?;

        assert_eq!(inventory.devices.len(), 6);

        let core = &inventory.devices[0];
        assert_eq!(core.kind()?, DeviceKind::Ssh);
        assert_eq!(core.dialect()?, Dialect::CiscoIos);
        assert_eq!(
            core.credentials().enable_secret().map(|s| s.expose_secret().to_string()),
            Some("enable123".to_string())
        );
        assert!(core.verify_tls);

        let nx = &inventory.devices[1];
        assert_eq!(nx.dialect()?, Dialect::CiscoNxos);
        assert_eq!(nx.port, Some(2222));

        assert!(!inventory.devices[3].verify_tls);

        Ok(())
    }

    #[test]
    fn populate_skips_unknown_types_and_dialects() -> anyhow::Result<()> {
        env_logger::try_init().ok();

        let inventory = Inventory::from_yaml(INVENTORY)?;
        let mut manager = NetworkManager::new();

        let registered = inventory.populate(&mut manager);

        assert_eq!(registered, vec!["core-sw1", "edge-nx", "ise", "dnac"]);
        assert_eq!(manager.len(), 4);
        assert_eq!(manager.get_mut("ise").map(|c| c.kind()), Some(DeviceKind::Ise));
        assert_eq!(
            manager.get_mut("dnac").map(|c| c.host().to_string()),
            Some("dnac.example.com".to_string())
        );
        assert!(manager.devices().all(|(_, c)| !c.is_connected()));

        Ok(())
    }

    #[test]
    fn unknown_type_is_reported() -> anyhow::Result<()> {
        let inventory = Inventory::from_yaml(INVENTORY)?;

        let result = inventory.devices[4].build();
        assert!(matches!(result, Err(Error::UnsupportedType(ref t)) if t == "telnet"));

        let result = inventory.devices[5].build();
        assert!(matches!(result, Err(Error::UnsupportedDialect(ref d)) if d == "juniper_junos"));

        Ok(())
    }

    #[test]
    fn loads_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(INVENTORY.as_bytes())?;

        let inventory = Inventory::load(file.path())?;
        assert_eq!(inventory.devices[2].name, "ise");

        Ok(())
    }

    #[test]
    fn empty_and_malformed_documents() {
        assert!(matches!(Inventory::from_yaml("  \n"), Ok(inv) if inv.devices.is_empty()));
        assert!(matches!(Inventory::from_yaml("devices: [name"), Err(Error::Config(_))));
        assert!(matches!(Inventory::load("/nonexistent/netshell.yaml"), Err(Error::Io(_))));
    }
}
