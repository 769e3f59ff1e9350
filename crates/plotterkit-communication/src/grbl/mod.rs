//! GRBL protocol support
//!
//! Acknowledgment classification and error/alarm code decoding.

pub mod ack;
pub mod codes;

pub use ack::Ack;
pub use codes::{describe_alarm, describe_error};
