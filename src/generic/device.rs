use strum::{Display, EnumString};

use crate::DeviceKind;
use crate::error::Error;

/// Capability set shared by every managed device.
///
/// A connection is built disconnected. `connect` acquires the session,
/// `execute_command` may then be called any number of times, and
/// `disconnect` releases it again.
pub trait DeviceConnection {
    /// Opens the session. Transport and authentication failures are returned
    /// to the caller untouched.
    fn connect(&mut self) -> Result<(), Error>;

    /// Releases the session. A no-op when the connection was never opened or
    /// has already been closed.
    fn disconnect(&mut self) -> Result<(), Error>;

    /// Runs a CLI command (SSH) or GETs an endpoint (API) and returns the
    /// textual output. Fails with [`Error::NotConnected`] outside a session.
    fn execute_command(&mut self, command: &str) -> Result<String, Error>;

    fn is_connected(&self) -> bool;

    /// Variant tag, so callers can pick devices without inspecting types.
    fn kind(&self) -> DeviceKind;

    /// Address the connection targets, for display.
    fn host(&self) -> &str;
}

/// Named read-only queries served by the REST controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ControllerQuery {
    Endpoints,
    EndpointGroups,
    Devices,
    Sites,
}

impl ControllerQuery {
    /// Endpoint path relative to the controller's API root.
    pub fn endpoint(self) -> &'static str {
        match self {
            ControllerQuery::Endpoints => "endpoints",
            ControllerQuery::EndpointGroups => "endpoint-groups",
            ControllerQuery::Devices => "devices",
            ControllerQuery::Sites => "sites",
        }
    }

    /// The kind of controller that answers this query.
    pub fn served_by(self) -> DeviceKind {
        match self {
            ControllerQuery::Endpoints | ControllerQuery::EndpointGroups => DeviceKind::Ise,
            ControllerQuery::Devices | ControllerQuery::Sites => DeviceKind::Dnac,
        }
    }
}
