use super::ApiConnection;
use crate::DeviceKind;
use crate::credentials::Credentials;
use crate::error::Error;
use crate::generic::device::{ControllerQuery, DeviceConnection};

const API_ROOT: &str = "/dna/intent/api/v1";
const AUTH_PATH: &str = "/dna/system/api/v1/auth/token";
const TOKEN_HEADER: &str = "X-Auth-Token";

/// Cisco DNA Center.
pub struct CiscoDnaCenter {
    api: ApiConnection,
}

impl CiscoDnaCenter {
    pub fn new(host: &str, credentials: Credentials) -> Self {
        Self::with_server(host, &format!("https://{host}"), credentials)
    }

    /// Targets `server` (scheme, host and port) instead of `https://{host}`.
    pub fn with_server(host: &str, server: &str, credentials: Credentials) -> Self {
        let server = server.trim_end_matches('/');

        CiscoDnaCenter {
            api: ApiConnection::new(
                DeviceKind::Dnac,
                host,
                format!("{server}{API_ROOT}"),
                format!("{server}{AUTH_PATH}"),
                credentials,
            )
            .token_header(TOKEN_HEADER),
        }
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.api = self.api.verify_tls(verify);
        self
    }

    pub fn get_devices(&mut self) -> Result<String, Error> {
        self.execute_command(ControllerQuery::Devices.endpoint())
    }

    pub fn get_sites(&mut self) -> Result<String, Error> {
        self.execute_command(ControllerQuery::Sites.endpoint())
    }
}

delegate_connection!(CiscoDnaCenter, api);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_override() {
        let dnac = CiscoDnaCenter::with_server(
            "dnac.lab",
            "http://127.0.0.1:8080/",
            Credentials::new("admin", "pass"),
        );

        assert_eq!(dnac.api.base_url(), "http://127.0.0.1:8080/dna/intent/api/v1");
        assert_eq!(dnac.kind(), DeviceKind::Dnac);
    }
}
