//! PlotterKit Settings Crate
//!
//! Turns a flat key-value settings mapping into a validated [`PlotterConfig`].
//! The mapping can come from a TOML, JSON or INI-style file.

pub mod config;
pub mod error;
pub mod source;

pub use config::{ConnectionSettings, FolderSettings, PenSettings, PlotterConfig};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
pub use source::{SettingsFormat, SettingsMap};
