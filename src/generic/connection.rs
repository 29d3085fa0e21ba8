use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use encoding_rs::{CoderResult, Decoder, Encoding};
use log::debug;
use regex::Regex;
use secrecy::ExposeSecret;
use ssh2::{Channel, Session};

use crate::credentials::Credentials;
use crate::error::Error;

const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SESSION_TIMEOUT_MS: u32 = 60000;

/// An interactive CLI stream to a device.
pub trait Shell: Sized {
    /// Logs in and starts an interactive shell. Output is decoded with `encoding`.
    fn open(
        host: &str,
        port: u16,
        credentials: &Credentials,
        encoding: &'static Encoding,
    ) -> Result<Self, Error>;

    /// Reads until the last line of output matches `prompt_end`.
    fn read(&mut self, prompt_end: &Regex) -> Result<String, Error>;

    /// Sends one line and reads its output up to `prompt_end`.
    fn execute(&mut self, command: &str, prompt_end: &Regex) -> Result<String, Error>;

    /// Like [`Shell::execute`], but the line is never logged.
    fn execute_secret(&mut self, secret: &str, prompt_end: &Regex) -> Result<String, Error>;

    fn close(&mut self) -> Result<(), Error>;
}

/// [`Shell`] over an ssh2 pty channel.
pub struct SshShell {
    #[allow(dead_code)]
    sess: Session,
    channel: Channel,
    encoding: &'static Encoding,
}

impl SshShell {
    /// TCP connect, handshake and password authentication.
    pub fn establish_session(
        host: &str,
        port: u16,
        credentials: &Credentials,
    ) -> Result<Session, Error> {
        let mut last_err = None;
        let mut tcp = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, TCP_CONNECT_TIMEOUT) {
                Ok(stream) => {
                    tcp = Some(stream);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let tcp = match (tcp, last_err) {
            (Some(tcp), _) => tcp,
            (None, Some(e)) => return Err(e.into()),
            (None, None) => {
                return Err(io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("no socket address resolved for {host}"),
                )
                .into());
            }
        };

        let mut sess = Session::new()?;
        sess.set_timeout(SESSION_TIMEOUT_MS);
        sess.set_tcp_stream(tcp);
        sess.handshake()?;

        // ssh2 reports a rejected password as an error too; fold both into
        // the same authentication failure.
        let auth = sess.userauth_password(
            credentials.username(),
            credentials.password().expose_secret(),
        );
        if auth.is_err() || !sess.authenticated() {
            debug!("Password authentication rejected by {}: {:?}", host, auth.err());
            return Err(Error::AuthenticationFailed {
                user: credentials.username().to_string(),
            });
        }

        Ok(sess)
    }
}

impl Shell for SshShell {
    fn open(
        host: &str,
        port: u16,
        credentials: &Credentials,
        encoding: &'static Encoding,
    ) -> Result<Self, Error> {
        let sess = Self::establish_session(host, port, credentials)?;

        let mut channel = sess.channel_session()?;
        channel.request_pty("vt100", None, None)?;
        channel.shell()?;

        Ok(SshShell {
            sess,
            channel,
            encoding,
        })
    }

    fn read(&mut self, prompt_end: &Regex) -> Result<String, Error> {
        debug!("Reading...");
        let mut decoder = self.encoding.new_decoder();
        let mut output = String::new();

        loop {
            let mut buf = [0u8; 1024];

            let size = match self.channel.read(&mut buf) {
                Ok(0) => {
                    debug!("Channel closed by peer");
                    break;
                }
                Ok(s) => s,
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                    debug!("Timed out... Assuming no data");
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            decode_into(&mut decoder, &buf[..size], &mut output, false);

            if prompt_end.is_match(last_line(&output)) {
                debug!("Found prompt. Ready for next command");
                break;
            }
        }

        decode_into(&mut decoder, &[], &mut output, true);
        debug!("Read: {}", output);

        Ok(output)
    }

    fn execute(&mut self, command: &str, prompt_end: &Regex) -> Result<String, Error> {
        debug!("Wrote: {}", command);

        self.channel.write_all(command.as_bytes())?;
        self.channel.write_all(b"\n")?;
        self.channel.flush()?;

        self.read(prompt_end)
    }

    fn execute_secret(&mut self, secret: &str, prompt_end: &Regex) -> Result<String, Error> {
        debug!("Wrote: ********");

        self.channel.write_all(secret.as_bytes())?;
        self.channel.write_all(b"\n")?;
        self.channel.flush()?;

        self.read(prompt_end)
    }

    fn close(&mut self) -> Result<(), Error> {
        self.channel.send_eof()?;
        self.channel.close()?;
        self.channel.wait_close()?;

        Ok(())
    }
}

/// Appends `src` to `dst`. Multi-byte sequences split across reads are kept
/// in the decoder until the rest arrives.
fn decode_into(decoder: &mut Decoder, mut src: &[u8], dst: &mut String, last: bool) {
    loop {
        let needed = decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or(src.len() * 3 + 16);
        dst.reserve(needed);

        let (result, read, _) = decoder.decode_to_string(src, dst, last);
        src = &src[read..];
        if matches!(result, CoderResult::InputEmpty) {
            return;
        }
    }
}

/// The last non-blank line of `output`, where a prompt would sit.
fn last_line(output: &str) -> &str {
    let trimmed = output.trim_end();
    let start = trimmed.rfind('\n').map_or(0, |i| i + 1);

    &output[start..]
}
