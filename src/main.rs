use std::io;
use std::path::PathBuf;

use clap::Parser;

mod logging;
mod shell;
use shell::Shell;

/// Interactive shell for Cisco switches, routers, ISE and DNA Center.
#[derive(Parser)]
#[command(name = "netshell", version, about)]
struct Cli {
    /// Device inventory to load before the prompt appears.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default log filter; RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// File the log is appended to, next to stderr.
    #[arg(long, default_value = "netshell.log")]
    log_file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level, &cli.log_file)?;

    let mut shell = Shell::new();
    if let Some(path) = &cli.config {
        let names = shell.load(path)?;
        println!("Loaded {} device(s) from {}", names.len(), path.display());
    }

    shell.run(io::stdin().lock(), &mut io::stdout())?;
    println!("Exiting...");

    Ok(())
}
