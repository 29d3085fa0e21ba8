use strum::{Display, EnumString};

pub mod api;
pub mod credentials;
pub mod error;
pub mod generic;
pub mod inventory;
pub mod manager;
pub mod scp;
pub mod ssh;
pub mod vendor;

pub use api::{ApiConnection, CiscoDnaCenter, CiscoIse};
pub use credentials::Credentials;
pub use error::Error;
pub use generic::device::{ControllerQuery, DeviceConnection};
pub use inventory::Inventory;
pub use manager::NetworkManager;
pub use ssh::SshConnection;
pub use vendor::Dialect;

/// Which kind of connection a device is reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DeviceKind {
    /// CLI over SSH.
    Ssh,
    /// Cisco ISE REST API.
    Ise,
    /// Cisco DNA Center REST API.
    Dnac,
}

/// Transport settings for [`create_connection`]. A kind ignores the fields
/// it has no use for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// CLI dialect of an SSH device.
    pub dialect: Dialect,
    /// SSH port.
    pub port: u16,
    /// Controller server root; `https://{host}` when `None`.
    pub server: Option<String>,
    /// `false` accepts self-signed controller certificates.
    pub verify_tls: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            dialect: Dialect::default(),
            port: ssh::DEFAULT_SSH_PORT,
            server: None,
            verify_tls: true,
        }
    }
}

/// Creates a disconnected connection of the given kind.
///
/// # Arguments
/// * `kind` - How the device is reached.
/// * `host` - Address of the device or controller.
/// * `credentials` - Login material, owned by the connection.
/// * `options` - Port, dialect and controller settings.
pub fn create_connection(
    kind: DeviceKind,
    host: &str,
    credentials: Credentials,
    options: &ConnectOptions,
) -> Box<dyn DeviceConnection> {
    let server = options
        .server
        .clone()
        .unwrap_or_else(|| format!("https://{host}"));

    match kind {
        DeviceKind::Ssh => Box::new(
            SshConnection::new(host, credentials, options.dialect).port(options.port),
        ),
        DeviceKind::Ise => Box::new(
            CiscoIse::with_server(host, &server, credentials).verify_tls(options.verify_tls),
        ),
        DeviceKind::Dnac => Box::new(
            CiscoDnaCenter::with_server(host, &server, credentials)
                .verify_tls(options.verify_tls),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn kinds_parse_from_config_names() {
        assert_eq!(DeviceKind::from_str("ssh").ok(), Some(DeviceKind::Ssh));
        assert_eq!(DeviceKind::from_str("dnac").ok(), Some(DeviceKind::Dnac));
        assert!(DeviceKind::from_str("telnet").is_err());
        assert_eq!(DeviceKind::Ise.to_string(), "ise");
    }

    #[test]
    fn created_connections_start_disconnected() {
        let creds = Credentials::new("admin", "pass");

        for kind in [DeviceKind::Ssh, DeviceKind::Ise, DeviceKind::Dnac] {
            let mut conn =
                create_connection(kind, "10.0.0.1", creds.clone(), &ConnectOptions::default());

            assert_eq!(conn.kind(), kind);
            assert!(!conn.is_connected());
            assert!(conn.disconnect().is_ok());
            assert!(matches!(conn.execute_command("show clock"), Err(Error::NotConnected(_))));
        }
    }
}
