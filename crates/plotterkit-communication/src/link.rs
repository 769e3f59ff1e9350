//! Serial link to a GRBL-style controller
//!
//! Streaming is strictly lock-step: every command line is written, then
//! exactly one reply line is read before the next write. The controller's
//! reply is classified and logged but never stops the stream; only I/O
//! failures do.
//!
//! A session moves through `Open -> Streaming -> Open` for each stream and
//! ends `Closed`, either explicitly or when it is dropped.

use crate::error::{SerialError, SerialResult};
use crate::grbl::Ack;
use crate::serial::{SerialTransport, SerialportTransport};
use std::io;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sent on open to wake the controller
pub const WAKE_SEQUENCE: &[u8] = b"\r\n\r\n";

/// Time the controller gets to boot and print its banner after waking
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(2);

/// Connection parameters for a serial link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialLink {
    port: String,
    baud_rate: u32,
    settle: Duration,
}

impl SerialLink {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            settle: DEFAULT_SETTLE,
        }
    }

    /// Override the post-wake settle interval
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Open the physical port and run the wake handshake
    pub fn open(&self) -> SerialResult<SerialSession> {
        info!("Opening {} at {} baud", self.port, self.baud_rate);
        let transport = SerialportTransport::open(&self.port, self.baud_rate).map_err(|source| {
            SerialError::ConnectionFailed {
                port: self.port.clone(),
                source,
            }
        })?;
        self.open_with(transport)
    }

    /// Run the wake handshake over an already-open transport
    pub fn open_with<T>(&self, mut transport: T) -> SerialResult<SerialSession>
    where
        T: SerialTransport + 'static,
    {
        let connection_failed = |source: io::Error| SerialError::ConnectionFailed {
            port: self.port.clone(),
            source,
        };

        transport.write_all(WAKE_SEQUENCE).map_err(connection_failed)?;
        thread::sleep(self.settle);
        transport.clear_input().map_err(connection_failed)?;

        debug!("Controller on {} is awake", self.port);
        Ok(SerialSession {
            port: self.port.clone(),
            transport: Some(Box::new(transport)),
            state: SessionState::Open,
        })
    }
}

/// Open a link with the default settle interval
pub fn open(port: &str, baud_rate: u32) -> SerialResult<SerialSession> {
    SerialLink::new(port, baud_rate).open()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Streaming,
    Closed,
}

/// Summary of one streamed program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamReport {
    /// Lines written to the controller
    pub sent: usize,
    /// Comment and blank lines that were not sent
    pub skipped: usize,
    /// Lines answered with `error:N` or `ALARM:N`
    pub error_acks: usize,
}

/// One open connection to the controller
pub struct SerialSession {
    port: String,
    transport: Option<Box<dyn SerialTransport>>,
    state: SessionState,
}

impl SerialSession {
    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != SessionState::Closed
    }

    /// Send one line and wait for its acknowledgment.
    ///
    /// Blank lines and `;` comments are skipped without any I/O.
    pub fn send_line(&mut self, line: &str) -> SerialResult<Ack> {
        let command = line.trim();
        if command.is_empty() || command.starts_with(';') {
            return Ok(Ack::Skipped);
        }

        let transport = self.transport.as_mut().ok_or(SerialError::Closed)?;
        let protocol = |source: io::Error| SerialError::Protocol {
            line: command.to_string(),
            source,
        };

        let mut data = Vec::with_capacity(command.len() + 1);
        data.extend_from_slice(command.as_bytes());
        data.push(b'\n');
        transport.write_all(&data).map_err(protocol)?;

        let reply = transport.read_line().map_err(protocol)?.ok_or_else(|| {
            protocol(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "controller closed the connection",
            ))
        })?;

        let ack = Ack::parse(&reply);
        match &ack {
            Ack::Error(_) | Ack::Alarm(_) => warn!("{} -> {}", command, ack),
            _ => debug!("{} -> {}", command, ack),
        }
        Ok(ack)
    }

    /// Send every line in order
    pub fn stream<I, S>(&mut self, lines: I) -> SerialResult<StreamReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.state == SessionState::Closed {
            return Err(SerialError::Closed);
        }

        self.state = SessionState::Streaming;
        let result = self.stream_lines(lines);
        if self.state == SessionState::Streaming {
            self.state = SessionState::Open;
        }

        if let Ok(report) = &result {
            info!(
                "Streamed {} lines to {} ({} skipped, {} error acks)",
                report.sent, self.port, report.skipped, report.error_acks
            );
        }
        result
    }

    fn stream_lines<I, S>(&mut self, lines: I) -> SerialResult<StreamReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = StreamReport::default();
        for line in lines {
            match self.send_line(line.as_ref())? {
                Ack::Skipped => report.skipped += 1,
                ack => {
                    report.sent += 1;
                    if ack.is_failure() {
                        report.error_acks += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    /// Release the port. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            info!("Closed {}", self.port);
        }
        self.state = SessionState::Closed;
    }
}

impl Drop for SerialSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SerialSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSession")
            .field("port", &self.port)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedTransport {
        replies: VecDeque<String>,
    }

    impl SerialTransport for ScriptedTransport {
        fn write_all(&mut self, _data: &[u8]) -> io::Result<()> {
            Ok(())
        }

        fn read_line(&mut self) -> io::Result<Option<String>> {
            Ok(self.replies.pop_front())
        }

        fn clear_input(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn session(replies: &[&str]) -> SerialSession {
        let transport = ScriptedTransport {
            replies: replies.iter().map(|s| s.to_string()).collect(),
        };
        SerialLink::new("test", 115200)
            .with_settle(Duration::ZERO)
            .open_with(transport)
            .unwrap()
    }

    #[test]
    fn test_skipped_lines_need_no_reply() {
        let mut s = session(&[]);
        assert_eq!(s.send_line("; comment").unwrap(), Ack::Skipped);
        assert_eq!(s.send_line("   ").unwrap(), Ack::Skipped);
    }

    #[test]
    fn test_error_ack_does_not_abort() {
        let mut s = session(&["ok", "error:22", "ok"]);
        let report = s.stream(["G21", "G1 X1", "G0 Z5"]).unwrap();
        assert_eq!(
            report,
            StreamReport {
                sent: 3,
                skipped: 0,
                error_acks: 1
            }
        );
        assert_eq!(s.state(), SessionState::Open);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut s = session(&[]);
        s.close();
        s.close();
        assert!(!s.is_open());
        assert!(matches!(s.send_line("G0 X0"), Err(SerialError::Closed)));
        assert!(matches!(s.stream(["G0 X0"]), Err(SerialError::Closed)));
    }
}
