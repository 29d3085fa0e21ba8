//! REST controllers reached over an authenticated HTTP session.
//!
//! [`ApiConnection`] does the transport work: a token login on `connect`,
//! then authenticated GETs relative to the controller's API root. The
//! controller types wrap it and add their named queries.

use log::{debug, info};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;
use serde_json::Value;

use crate::DeviceKind;
use crate::credentials::Credentials;
use crate::error::Error;
use crate::generic::device::DeviceConnection;

/// Implements [`DeviceConnection`] by forwarding to an inner `ApiConnection`.
macro_rules! delegate_connection {
    ($ty:ty, $field:ident) => {
        impl $crate::generic::device::DeviceConnection for $ty {
            fn connect(&mut self) -> Result<(), $crate::error::Error> {
                self.$field.connect()
            }

            fn disconnect(&mut self) -> Result<(), $crate::error::Error> {
                self.$field.disconnect()
            }

            fn execute_command(&mut self, command: &str) -> Result<String, $crate::error::Error> {
                self.$field.execute_command(command)
            }

            fn is_connected(&self) -> bool {
                self.$field.is_connected()
            }

            fn kind(&self) -> $crate::DeviceKind {
                self.$field.kind()
            }

            fn host(&self) -> &str {
                self.$field.host()
            }
        }
    };
}

pub mod dnac;
pub mod ise;

pub use dnac::CiscoDnaCenter;
pub use ise::CiscoIse;

/// Fields a login response may carry the session token in.
const TOKEN_FIELDS: [&str; 3] = ["token", "Token", "access_token"];

/// Authenticated HTTP session against one controller.
pub struct ApiConnection {
    kind: DeviceKind,
    host: String,
    base_url: String,
    auth_url: String,
    credentials: Credentials,
    /// Header repeating the token next to `Authorization: Bearer`.
    token_header: Option<&'static str>,
    verify_tls: bool,
    session: Option<ApiSession>,
}

struct ApiSession {
    client: Client,
    token: String,
}

impl ApiConnection {
    pub fn new(
        kind: DeviceKind,
        host: impl Into<String>,
        base_url: impl Into<String>,
        auth_url: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        ApiConnection {
            kind,
            host: host.into(),
            base_url: base_url.into(),
            auth_url: auth_url.into(),
            credentials,
            token_header: None,
            verify_tls: true,
            session: None,
        }
    }

    pub fn token_header(mut self, name: &'static str) -> Self {
        self.token_header = Some(name);
        self
    }

    /// `false` accepts self-signed controller certificates.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn login(&self, client: &Client) -> Result<String, Error> {
        debug!("POST {}", self.auth_url);

        let resp = client
            .post(&self.auth_url)
            .basic_auth(
                self.credentials.username(),
                Some(self.credentials.password().expose_secret()),
            )
            .header(ACCEPT, "application/json")
            .send()?;

        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(Error::AuthenticationFailed {
                user: self.credentials.username().to_string(),
            });
        }

        let resp = resp.error_for_status()?;
        let body = parse_json(&self.auth_url, &resp.text()?)?;

        TOKEN_FIELDS
            .iter()
            .find_map(|field| body.get(field).and_then(Value::as_str))
            .map(String::from)
            .ok_or_else(|| Error::InvalidResponse {
                url: self.auth_url.clone(),
                reason: "no token in login response".to_string(),
            })
    }
}

fn parse_json(url: &str, body: &str) -> Result<Value, Error> {
    serde_json::from_str(body).map_err(|e| Error::InvalidResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

impl DeviceConnection for ApiConnection {
    fn connect(&mut self) -> Result<(), Error> {
        if self.session.is_some() {
            return Ok(());
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(!self.verify_tls)
            .build()?;
        let token = self.login(&client)?;

        info!("Authenticated to {} as {}", self.host, self.credentials.username());
        self.session = Some(ApiSession { client, token });

        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Error> {
        if self.session.take().is_some() {
            info!("Closed API session to {}", self.host);
        }

        Ok(())
    }

    /// GETs `endpoint` under the API root and returns the body as indented JSON.
    fn execute_command(&mut self, endpoint: &str) -> Result<String, Error> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| Error::NotConnected(self.host.clone()))?;
        let url = self.endpoint_url(endpoint);
        debug!("GET {}", url);

        let mut req = session
            .client
            .get(&url)
            .bearer_auth(&session.token)
            .header(ACCEPT, "application/json");
        if let Some(name) = self.token_header {
            req = req.header(name, &session.token);
        }

        let resp = req.send()?.error_for_status()?;
        let body = parse_json(&url, &resp.text()?)?;

        serde_json::to_string_pretty(&body).map_err(|e| Error::InvalidResponse {
            url,
            reason: e.to_string(),
        })
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn host(&self) -> &str {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(base: &str) -> ApiConnection {
        ApiConnection::new(
            DeviceKind::Dnac,
            "dnac.lab",
            base,
            "https://dnac.lab/auth",
            Credentials::new("admin", "pass"),
        )
    }

    #[test]
    fn joins_endpoint_paths() {
        assert_eq!(
            conn("https://dnac.lab/api/v1/").endpoint_url("/devices"),
            "https://dnac.lab/api/v1/devices"
        );
        assert_eq!(
            conn("https://dnac.lab/api/v1").endpoint_url("sites"),
            "https://dnac.lab/api/v1/sites"
        );
    }

    #[test]
    fn not_connected_until_login() {
        let mut api = conn("https://dnac.lab/api/v1");

        let result = api.execute_command("devices");
        assert!(matches!(result, Err(Error::NotConnected(ref h)) if h == "dnac.lab"));

        assert!(api.disconnect().is_ok());
        assert!(!api.is_connected());
    }
}
