use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Env, Target};

/// Log sink writing every record to a file and to stderr.
pub struct Tee<W> {
    file: W,
}

impl<W: Write> Tee<W> {
    pub fn new(file: W) -> Self {
        Tee { file }
    }
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        io::stderr().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        io::stderr().flush()
    }
}

/// Sets up env_logger with `default_level` unless RUST_LOG is set, appending
/// to `log_file` as well as stderr.
pub fn init(default_level: &str, log_file: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Pipe(Box::new(Tee::new(file))))
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn tee_writes_through_to_file() -> anyhow::Result<()> {
        let file = tempfile::NamedTempFile::new()?;

        let mut tee = Tee::new(file.reopen()?);
        writeln!(tee, "[INFO] Loaded configuration")?;
        tee.flush()?;

        assert_eq!(fs::read_to_string(file.path())?, "[INFO] Loaded configuration\n");

        Ok(())
    }
}
