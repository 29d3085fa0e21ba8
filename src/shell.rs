use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{info, warn};
use netshell::scp::{self, ScpTransfer};
use netshell::ssh::DEFAULT_SSH_PORT;
use netshell::{ControllerQuery, DeviceKind, Error, Inventory, NetworkManager};
use tabled::settings::Style;
use tabled::{Table, Tabled};

pub const INTRO: &str = "
    Network Automation Shell
    Type 'help' or '?' to list commands.
    Type 'exit' or 'quit' to exit.
";
pub const PROMPT: &str = "network-cli> ";
const DEFAULT_CONFIG: &str = "config.yaml";

const HELP: &str = "\
Commands:
  load [file]                      Load devices from a YAML file (default: config.yaml)
  devices                          List configured devices
  exec <dev1,dev2,...> <command>   Run a CLI command on the given devices
  ise <endpoints|groups>           Query every ISE controller
  dnac <devices|sites>             Query every DNA Center controller
  push <device> <local> <remote>   Copy a file to a device over SCP
  clear                            Clear the screen
  exit | quit                      Leave the shell";

/// One parsed input line.
#[derive(Debug, PartialEq)]
pub enum Command {
    Empty,
    Load(Option<String>),
    Devices,
    Exec { devices: Vec<String>, command: String },
    Query(ControllerQuery),
    Push { device: String, local: PathBuf, remote: String },
    Clear,
    Help,
    Exit,
}

impl Command {
    /// Parses a line. The error is the message to show the user.
    pub fn parse(line: &str) -> Result<Command, String> {
        let Some(words) = shlex::split(line) else {
            return Err("Error: No closing quotation".to_string());
        };
        let Some((verb, args)) = words.split_first() else {
            return Ok(Command::Empty);
        };

        match verb.as_str() {
            "load" => Ok(Command::Load(args.first().cloned())),
            "devices" => Ok(Command::Devices),
            "exec" => {
                let [devices, command @ ..] = args else {
                    return Err("Error: Please specify devices and command".to_string());
                };
                if command.is_empty() {
                    return Err("Error: Please specify devices and command".to_string());
                }
                Ok(Command::Exec {
                    devices: devices
                        .split(',')
                        .filter(|d| !d.is_empty())
                        .map(String::from)
                        .collect(),
                    command: command.join(" "),
                })
            }
            "ise" => match args.first().map(String::as_str) {
                None => Err("Please specify action: endpoints or groups".to_string()),
                Some("endpoints") => Ok(Command::Query(ControllerQuery::Endpoints)),
                Some("groups") => Ok(Command::Query(ControllerQuery::EndpointGroups)),
                Some(_) => Err("Invalid action. Use 'endpoints' or 'groups'".to_string()),
            },
            "dnac" => match args.first().map(String::as_str) {
                None => Err("Please specify action: devices or sites".to_string()),
                Some("devices") => Ok(Command::Query(ControllerQuery::Devices)),
                Some("sites") => Ok(Command::Query(ControllerQuery::Sites)),
                Some(_) => Err("Invalid action. Use 'devices' or 'sites'".to_string()),
            },
            "push" => match args {
                [device, local, remote] => Ok(Command::Push {
                    device: device.clone(),
                    local: PathBuf::from(local),
                    remote: remote.clone(),
                }),
                _ => Err("Usage: push <device> <local> <remote>".to_string()),
            },
            "clear" => Ok(Command::Clear),
            "help" | "?" => Ok(Command::Help),
            "exit" | "quit" => Ok(Command::Exit),
            _ => Err(format!(
                "Unknown command: {}\nType 'help' or '?' to list available commands.",
                line.trim()
            )),
        }
    }
}

/// Interactive session state: the loaded inventory and its devices.
#[derive(Default)]
pub struct Shell {
    inventory: Inventory,
    manager: NetworkManager,
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current inventory with the one in `path`. Returns the
    /// names of the devices that were registered.
    pub fn load(&mut self, path: &Path) -> Result<Vec<String>, Error> {
        let inventory = Inventory::load(path)?;

        let mut manager = NetworkManager::new();
        let registered = inventory.populate(&mut manager);

        self.manager.disconnect_all();
        self.manager = manager;
        self.inventory = inventory;
        info!("Loaded configuration from {}", path.display());

        Ok(registered)
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        writeln!(out, "{INTRO}")?;

        let mut lines = input.lines();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };

            match Command::parse(&line?) {
                Ok(Command::Exit) => break,
                Ok(command) => self.dispatch(command, out)?,
                Err(message) => writeln!(out, "{message}")?,
            }
        }

        self.manager.disconnect_all();
        Ok(())
    }

    fn dispatch<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<()> {
        match command {
            Command::Empty | Command::Exit => Ok(()),
            Command::Help => writeln!(out, "{HELP}"),
            Command::Clear => write!(out, "\x1B[2J\x1B[1;1H"),
            Command::Load(path) => {
                let path = PathBuf::from(path.as_deref().unwrap_or(DEFAULT_CONFIG));
                match self.load(&path) {
                    Ok(names) => {
                        for name in names {
                            writeln!(out, "Initialized device: {name}")?;
                        }
                        writeln!(out, "Successfully loaded configuration from {}", path.display())
                    }
                    Err(e) => writeln!(out, "Error loading config file: {e}"),
                }
            }
            Command::Devices => self.list_devices(out),
            Command::Exec { devices, command } => self.exec(&devices, &command, out),
            Command::Query(query) => self.query(query, out),
            Command::Push {
                device,
                local,
                remote,
            } => self.push(&device, &local, &remote, out),
        }
    }

    fn list_devices<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let rows: Vec<DeviceRow> = self
            .manager
            .devices()
            .map(|(name, conn)| DeviceRow {
                name: name.to_string(),
                kind: conn.kind().to_string(),
                host: conn.host().to_string(),
                connected: if conn.is_connected() { "yes" } else { "no" },
            })
            .collect();

        writeln!(out, "Configured Devices")?;
        writeln!(out, "{}", render_table(&rows))
    }

    fn exec<W: Write>(
        &mut self,
        devices: &[String],
        command: &str,
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(out, "Executing '{}' on {}...", command, devices.join(", "))?;

        for (name, result) in self.manager.try_connect(devices) {
            if let Err(e) = result {
                writeln!(out, "Warning: could not connect to {name}: {e}")?;
            }
        }

        let results = self.manager.execute_command_on_devices(devices, command);
        self.manager.disconnect_all();

        print_results(out, &format!("Command Results: {command}"), &results)
    }

    fn query<W: Write>(&mut self, query: ControllerQuery, out: &mut W) -> io::Result<()> {
        let results = self.manager.query_controllers(query);
        if results.is_empty() {
            return writeln!(out, "No {} controllers configured", query.served_by());
        }

        print_results(out, &query.to_string(), &results)
    }

    fn push<W: Write>(
        &mut self,
        device: &str,
        local: &Path,
        remote: &str,
        out: &mut W,
    ) -> io::Result<()> {
        let Some(spec) = self.inventory.devices.iter().find(|d| d.name == device) else {
            return writeln!(out, "Error: Device not found");
        };
        let Some(conn) = self.manager.get_mut(device) else {
            return writeln!(out, "Error: Device not found");
        };
        if conn.kind() != DeviceKind::Ssh {
            return writeln!(out, "Error: {device} is not an SSH device");
        }

        let mut transfer = ScpTransfer::new(&spec.host, spec.credentials())
            .port(spec.port.unwrap_or(DEFAULT_SSH_PORT));

        let result = conn
            .connect()
            .and_then(|()| scp::push_file(&mut *conn, &mut transfer, local, remote));
        if let Err(e) = conn.disconnect() {
            warn!("Failed to disconnect {}: {}", device, e);
        }

        match result {
            Ok(bytes) => writeln!(out, "Copied {} bytes to {device}:{remote}", bytes),
            Err(e) => writeln!(out, "Error: {e}"),
        }
    }
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Connected")]
    connected: &'static str,
}

#[derive(Tabled)]
struct ResultRow<'a> {
    #[tabled(rename = "Device")]
    device: &'a str,
    #[tabled(rename = "Output")]
    output: &'a str,
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn print_results<W: Write>(
    out: &mut W,
    title: &str,
    results: &IndexMap<String, String>,
) -> io::Result<()> {
    let rows: Vec<ResultRow<'_>> = results
        .iter()
        .map(|(device, output)| ResultRow { device, output })
        .collect();

    writeln!(out, "{title}")?;
    writeln!(out, "{}", render_table(&rows))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn parses_exec() {
        assert_eq!(
            Command::parse("exec switch1,switch2 show ip int brief"),
            Ok(Command::Exec {
                devices: vec!["switch1".to_string(), "switch2".to_string()],
                command: "show ip int brief".to_string(),
            })
        );
        assert_eq!(
            Command::parse("exec switch1"),
            Err("Error: Please specify devices and command".to_string())
        );
        assert!(Command::parse("exec").is_err());
    }

    #[test]
    fn parses_controller_queries() {
        assert_eq!(
            Command::parse("ise groups"),
            Ok(Command::Query(ControllerQuery::EndpointGroups))
        );
        assert_eq!(Command::parse("dnac sites"), Ok(Command::Query(ControllerQuery::Sites)));
        assert_eq!(
            Command::parse("dnac"),
            Err("Please specify action: devices or sites".to_string())
        );
        assert_eq!(
            Command::parse("ise users"),
            Err("Invalid action. Use 'endpoints' or 'groups'".to_string())
        );
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(Command::parse("   "), Ok(Command::Empty));
        assert_eq!(Command::parse("load"), Ok(Command::Load(None)));
        assert_eq!(
            Command::parse("load lab.yaml"),
            Ok(Command::Load(Some("lab.yaml".to_string())))
        );
        assert_eq!(Command::parse("quit"), Ok(Command::Exit));
        assert_eq!(Command::parse("?"), Ok(Command::Help));
        assert_eq!(
            Command::parse("push sw1 /tmp/a.bin flash:/a.bin"),
            Ok(Command::Push {
                device: "sw1".to_string(),
                local: PathBuf::from("/tmp/a.bin"),
                remote: "flash:/a.bin".to_string(),
            })
        );
        assert!(
            Command::parse("reboot now")
                .is_err_and(|m| m.starts_with("Unknown command: reboot now"))
        );
    }

    #[test]
    fn parses_quoted_arguments() {
        assert_eq!(
            Command::parse(r#"exec sw1 show run | include "ip scp""#),
            Ok(Command::Exec {
                devices: vec!["sw1".to_string()],
                command: "show run | include ip scp".to_string(),
            })
        );
        assert_eq!(
            Command::parse("load 'lab inventory.yaml'"),
            Ok(Command::Load(Some("lab inventory.yaml".to_string())))
        );
        assert_eq!(
            Command::parse(r#"exec sw1 show "run"#),
            Err("Error: No closing quotation".to_string())
        );
    }

    #[test]
    fn results_render_as_aligned_table() -> anyhow::Result<()> {
        let mut results = IndexMap::new();
        results.insert(
            "distribution-switch-building-7".to_string(),
            "Vlan10 up\nVlan20 down".to_string(),
        );
        results.insert("r1".to_string(), "Error: Device not found".to_string());

        let mut out = Vec::new();
        print_results(&mut out, "Command Results: show vlan", &results)?;
        let out = String::from_utf8(out)?;

        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("Command Results: show vlan"));

        let table: Vec<&str> = lines.collect();
        let width = table[0].chars().count();
        assert!(table.iter().all(|l| l.chars().count() == width), "{out}");
        assert!(table.iter().any(|l| l.contains("Vlan10 up")));
        assert!(table.iter().any(|l| l.contains("Vlan20 down")));
        assert!(table[1].contains("Device") && table[1].contains("Output"));

        Ok(())
    }

    #[test]
    fn session_reports_missing_devices() -> anyhow::Result<()> {
        let input = Cursor::new("help\nexec r1,r2 show clock\nbogus\nexit\nexec r3 show clock\n");
        let mut out = Vec::new();

        Shell::new().run(input, &mut out)?;
        let out = String::from_utf8(out)?;

        assert!(out.contains("exec <dev1,dev2,...> <command>"));
        for device in ["r1", "r2"] {
            assert!(
                out.lines()
                    .any(|l| l.contains(device) && l.contains("Error: Device not found")),
                "{out}"
            );
        }
        assert!(out.contains("Unknown command: bogus"));
        assert!(!out.contains("r3"), "input after exit is ignored");

        Ok(())
    }

    #[test]
    fn load_registers_devices() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            "devices:\n  - name: sw1\n    type: ssh\n    host: 192.0.2.10\n    username: u\n    password: p\n  - name: ise\n    type: ise\n    host: ise.lab\n    username: u\n    password: p"
        )?;

        let mut shell = Shell::new();
        let names = shell.load(file.path())?;
        assert_eq!(names, vec!["sw1", "ise"]);

        let mut out = Vec::new();
        shell.dispatch(Command::Devices, &mut out)?;
        let out = String::from_utf8(out)?;
        assert!(out.contains("sw1"));
        assert!(out.contains("192.0.2.10"));
        assert!(out.contains("ise.lab"));

        let mut out = Vec::new();
        shell.dispatch(Command::Query(ControllerQuery::Sites), &mut out)?;
        assert_eq!(String::from_utf8(out)?, "No dnac controllers configured\n");

        Ok(())
    }
}
