//! Acknowledgment classification

use super::codes::{describe_alarm, describe_error};
use std::fmt;

/// Result of sending one line to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// `ok`
    Ok,
    /// `error:N`
    Error(u8),
    /// `ALARM:N`
    Alarm(u8),
    /// Any other reply line, such as a startup banner or `[MSG:...]`
    Other(String),
    /// The line was a comment or blank and was not sent
    Skipped,
}

impl Ack {
    /// Classify one reply line
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        if line.eq_ignore_ascii_case("ok") {
            return Ack::Ok;
        }

        if let Some(code) = line.strip_prefix("error:") {
            if let Ok(code) = code.trim().parse::<u8>() {
                return Ack::Error(code);
            }
        }

        if let Some(code) = line.strip_prefix("ALARM:") {
            if let Ok(code) = code.trim().parse::<u8>() {
                return Ack::Alarm(code);
            }
        }

        Ack::Other(line.to_string())
    }

    /// Error and alarm replies
    pub fn is_failure(&self) -> bool {
        matches!(self, Ack::Error(_) | Ack::Alarm(_))
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ack::Ok => write!(f, "ok"),
            Ack::Error(code) => write!(f, "error:{} ({})", code, describe_error(*code)),
            Ack::Alarm(code) => write!(f, "ALARM:{} ({})", code, describe_alarm(*code)),
            Ack::Other(text) => write!(f, "{}", text),
            Ack::Skipped => write!(f, "skipped"),
        }
    }
}
