use super::ApiConnection;
use crate::DeviceKind;
use crate::credentials::Credentials;
use crate::error::Error;
use crate::generic::device::{ControllerQuery, DeviceConnection};

const API_ROOT: &str = "/ers/config";
const AUTH_PATH: &str = "/api/v1/auth/token";

/// Cisco Identity Services Engine.
pub struct CiscoIse {
    api: ApiConnection,
}

impl CiscoIse {
    pub fn new(host: &str, credentials: Credentials) -> Self {
        Self::with_server(host, &format!("https://{host}"), credentials)
    }

    /// Targets `server` (scheme, host and port) instead of `https://{host}`.
    pub fn with_server(host: &str, server: &str, credentials: Credentials) -> Self {
        let server = server.trim_end_matches('/');

        CiscoIse {
            api: ApiConnection::new(
                DeviceKind::Ise,
                host,
                format!("{server}{API_ROOT}"),
                format!("{server}{AUTH_PATH}"),
                credentials,
            ),
        }
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.api = self.api.verify_tls(verify);
        self
    }

    pub fn get_endpoints(&mut self) -> Result<String, Error> {
        self.execute_command(ControllerQuery::Endpoints.endpoint())
    }

    pub fn get_endpoint_groups(&mut self) -> Result<String, Error> {
        self.execute_command(ControllerQuery::EndpointGroups.endpoint())
    }
}

delegate_connection!(CiscoIse, api);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls() {
        let ise = CiscoIse::new("ise.lab", Credentials::new("admin", "pass"));

        assert_eq!(ise.api.base_url(), "https://ise.lab/ers/config");
        assert_eq!(ise.kind(), DeviceKind::Ise);
        assert_eq!(ise.host(), "ise.lab");
    }
}
