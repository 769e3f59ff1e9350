//! # PlotterKit Communication
//!
//! Serial connection to a GRBL-style motion controller.
//!
//! - [`SerialLink`] opens a port, wakes the controller and flushes its banner
//! - [`SerialSession`] streams program lines with one acknowledgment per line
//! - [`grbl`] classifies acknowledgments and decodes error and alarm codes
//! - [`list_ports`] enumerates candidate ports

pub mod error;
pub mod grbl;
pub mod link;
pub mod serial;

pub use error::{SerialError, SerialResult};
pub use grbl::Ack;
pub use link::{open, SerialLink, SerialSession, SessionState, StreamReport, DEFAULT_SETTLE, WAKE_SEQUENCE};
pub use serial::{list_ports, SerialPortInfo, SerialTransport, SerialportTransport};
