//! Named registry of device connections with fan-out/collect execution.
//!
//! Devices are driven one at a time in registry (or request) order. Batch
//! execution never fails as a whole: every requested name gets exactly one
//! outcome string, and a failing device only affects its own entry.

use indexmap::IndexMap;
use log::{info, warn};

use crate::error::Error;
use crate::generic::device::{ControllerQuery, DeviceConnection};

/// Outcome recorded for a requested name with no registered connection.
pub const DEVICE_NOT_FOUND: &str = "Error: Device not found";

#[derive(Default)]
pub struct NetworkManager {
    devices: IndexMap<String, Box<dyn DeviceConnection>>,
}

fn error_outcome(err: &Error) -> String {
    format!("Error: {err}")
}

impl NetworkManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `connection`. A connection previously bound to the
    /// same name is disconnected before it is dropped.
    pub fn add_device(&mut self, name: impl Into<String>, connection: Box<dyn DeviceConnection>) {
        let name = name.into();

        if let Some(mut previous) = self.devices.insert(name.clone(), connection) {
            info!("Replacing device {}", name);
            if let Err(e) = previous.disconnect() {
                warn!("Failed to disconnect replaced device {}: {}", name, e);
            }
        }
    }

    /// Unregisters `name`, disconnecting its connection first.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn DeviceConnection>> {
        let mut connection = self.devices.shift_remove(name)?;
        if let Err(e) = connection.disconnect() {
            warn!("Failed to disconnect removed device {}: {}", name, e);
        }

        Some(connection)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn DeviceConnection + 'static)> {
        self.devices.get_mut(name).map(|c| c.as_mut())
    }

    pub fn devices(&self) -> impl Iterator<Item = (&str, &(dyn DeviceConnection + 'static))> {
        self.devices.iter().map(|(name, conn)| (name.as_str(), &**conn))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Connects every device in registry order, stopping at the first
    /// failure. Devices after the failing one are left unconnected.
    pub fn connect_all(&mut self) -> Result<(), Error> {
        for (name, conn) in self.devices.iter_mut() {
            if let Err(e) = conn.connect() {
                warn!("Failed to connect {}: {}", name, e);
                return Err(e);
            }
        }

        Ok(())
    }

    /// Connects the named devices, recording each outcome instead of
    /// stopping. Unregistered names are skipped.
    pub fn try_connect<I, S>(&mut self, names: I) -> IndexMap<String, Result<(), Error>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcomes = IndexMap::new();

        for name in names {
            let name = name.as_ref();
            let Some(conn) = self.devices.get_mut(name) else {
                continue;
            };

            let result = conn.connect();
            if let Err(e) = &result {
                warn!("Failed to connect {}: {}", name, e);
            }
            outcomes.insert(name.to_string(), result);
        }

        outcomes
    }

    /// Disconnects every device. All devices are attempted; the failures are
    /// returned by name.
    pub fn disconnect_all(&mut self) -> Vec<(String, Error)> {
        let mut failures = Vec::new();

        for (name, conn) in self.devices.iter_mut() {
            if let Err(e) = conn.disconnect() {
                warn!("Failed to disconnect {}: {}", name, e);
                failures.push((name.clone(), e));
            }
        }

        failures
    }

    /// Runs `command` on each named device in order.
    ///
    /// The result has one entry per distinct requested name: the device's
    /// output, [`DEVICE_NOT_FOUND`], or `"Error: {message}"` when execution
    /// failed.
    pub fn execute_command_on_devices<I, S>(
        &mut self,
        names: I,
        command: &str,
    ) -> IndexMap<String, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = IndexMap::new();

        for name in names {
            let name = name.as_ref();
            let outcome = match self.devices.get_mut(name) {
                None => DEVICE_NOT_FOUND.to_string(),
                Some(conn) => match conn.execute_command(command) {
                    Ok(output) => output,
                    Err(e) => {
                        warn!("Command failed on {}: {}", name, e);
                        error_outcome(&e)
                    }
                },
            };
            results.insert(name.to_string(), outcome);
        }

        results
    }

    /// Runs a controller query on every device of the kind that serves it.
    ///
    /// Each device gets its own connect, query and disconnect; failures are
    /// recorded as `"Error: {message}"` for that device only.
    pub fn query_controllers(&mut self, query: ControllerQuery) -> IndexMap<String, String> {
        let kind = query.served_by();
        let mut results = IndexMap::new();

        for (name, conn) in self.devices.iter_mut().filter(|(_, c)| c.kind() == kind) {
            let outcome = conn
                .connect()
                .and_then(|()| conn.execute_command(query.endpoint()));
            if let Err(e) = conn.disconnect() {
                warn!("Failed to disconnect {}: {}", name, e);
            }

            let outcome = outcome.unwrap_or_else(|e| {
                warn!("{} query failed on {}: {}", query, name, e);
                error_outcome(&e)
            });
            results.insert(name.clone(), outcome);
        }

        results
    }
}
