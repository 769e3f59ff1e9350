//! Error types for the communication crate.

use std::io;
use thiserror::Error;

/// Errors raised by the serial link
#[derive(Error, Debug)]
pub enum SerialError {
    /// The port could not be opened or the wake handshake failed.
    #[error("Failed to connect to {port}: {source}")]
    ConnectionFailed {
        port: String,
        #[source]
        source: io::Error,
    },

    /// Writing a command or reading its acknowledgment failed.
    #[error("Protocol error on '{line}': {source}")]
    Protocol {
        line: String,
        #[source]
        source: io::Error,
    },

    /// The session was already closed.
    #[error("Serial session is closed")]
    Closed,

    /// Port enumeration failed.
    #[error("Failed to enumerate serial ports: {0}")]
    Enumeration(String),
}

impl SerialError {
    pub fn is_connection_error(&self) -> bool {
        matches!(self, SerialError::ConnectionFailed { .. })
    }

    pub fn is_protocol_error(&self) -> bool {
        matches!(self, SerialError::Protocol { .. })
    }
}

/// Result type for serial operations
pub type SerialResult<T> = Result<T, SerialError>;
