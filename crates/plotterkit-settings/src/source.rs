//! Settings sources
//!
//! Reads and writes the flat key-value mapping that backs [`crate::PlotterConfig`].
//! Keys may sit at the top level of the file or inside a `GCodeSettings`
//! section; section entries win when both are present.

use crate::error::{ConfigError, SettingsResult};
use std::collections::BTreeMap;
use std::path::Path;

/// Flat key-value settings, as read from a settings file
pub type SettingsMap = BTreeMap<String, String>;

/// Name of the section that holds plotter settings
pub const SETTINGS_SECTION: &str = "GCodeSettings";

/// Supported settings file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Toml,
    Json,
    Ini,
}

impl SettingsFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "ini" | "cfg" | "conf" => Ok(Self::Ini),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Parse file content into a flat settings map
    pub fn parse(self, content: &str) -> SettingsResult<SettingsMap> {
        match self {
            Self::Toml => parse_toml(content),
            Self::Json => parse_json(content),
            Self::Ini => Ok(parse_ini(content)),
        }
    }

    /// Render a flat settings map, placing keys under the settings section
    pub fn render(self, map: &SettingsMap) -> SettingsResult<String> {
        match self {
            Self::Toml => {
                let mut root = BTreeMap::new();
                root.insert(SETTINGS_SECTION.to_string(), map.clone());
                Ok(toml::to_string_pretty(&root)?)
            }
            Self::Json => Ok(serde_json::to_string_pretty(map)?),
            Self::Ini => {
                let mut out = format!("[{}]\n", SETTINGS_SECTION);
                for (key, value) in map {
                    out.push_str(&format!("{} = {}\n", key, value));
                }
                Ok(out)
            }
        }
    }
}

fn parse_toml(content: &str) -> SettingsResult<SettingsMap> {
    let root: toml::Table = toml::from_str(content)?;
    let mut map = SettingsMap::new();

    for (key, value) in &root {
        if let Some(s) = toml_scalar(value) {
            map.insert(key.clone(), s);
        }
    }

    if let Some(toml::Value::Table(section)) = root.get(SETTINGS_SECTION) {
        for (key, value) in section {
            if let Some(s) = toml_scalar(value) {
                map.insert(key.clone(), s);
            }
        }
    }

    Ok(map)
}

fn toml_scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_json(content: &str) -> SettingsResult<SettingsMap> {
    let root: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
    let mut map = SettingsMap::new();

    for (key, value) in &root {
        if let Some(s) = json_scalar(value) {
            map.insert(key.clone(), s);
        }
    }

    if let Some(serde_json::Value::Object(section)) = root.get(SETTINGS_SECTION) {
        for (key, value) in section {
            if let Some(s) = json_scalar(value) {
                map.insert(key.clone(), s);
            }
        }
    }

    Ok(map)
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `key = value` lines before the first section header and inside the
/// settings section. Other sections and `#`/`;` comments are ignored.
fn parse_ini(content: &str) -> SettingsMap {
    let mut top_level = SettingsMap::new();
    let mut section = SettingsMap::new();
    let mut current: Option<&str> = None;

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = Some(name.trim());
            continue;
        }
        let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
            continue;
        };
        let target = match current {
            None => &mut top_level,
            Some(SETTINGS_SECTION) => &mut section,
            Some(_) => continue,
        };
        target.insert(key.trim().to_string(), value.trim().to_string());
    }

    top_level.extend(section);
    top_level
}
