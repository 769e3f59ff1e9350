//! Plotter configuration
//!
//! Provides the typed configuration the rest of the workspace consumes. It is
//! built once at startup from a flat key-value mapping and then passed by
//! reference to the converter, the job runner and the serial link.
//!
//! Required keys:
//! - `pen_down_position_mm`, `pen_travel_position_mm`, `pen_feed_rate_mm_min`
//! - `min_plot_x`, `max_plot_x`, `min_plot_y`, `max_plot_y`
//! - `usb_port`, `baud_rate`
//!
//! Pen positions are Z coordinates passed to the controller verbatim. Some
//! machines lower the pen towards negative Z, others towards positive Z, so
//! no sign convention is assumed; the two positions only have to differ.

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use crate::source::{SettingsFormat, SettingsMap};
use plotterkit_core::constants::*;
use plotterkit_core::PlotArea;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Pen motion settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenSettings {
    /// Z position that puts the pen on the paper
    pub down_position_mm: f64,
    /// Z position used for travel moves
    pub travel_position_mm: f64,
    /// Feed rate for drawing moves in mm/min
    pub feed_rate_mm_min: f64,
    /// Number of times each drawing is traced
    pub passes: u32,
    /// Optional file whose commands are emitted before the drawing
    pub preamble_file: Option<PathBuf>,
    /// Optional file whose commands are emitted after the drawing
    pub postamble_file: Option<PathBuf>,
}

/// Serial connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSettings {
    /// Serial device, e.g. "/dev/ttyUSB0" or "COM3"
    pub usb_port: String,
    /// Baud rate
    pub baud_rate: u32,
}

/// Folder roles of the plotting pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderSettings {
    /// Incoming images
    pub attachments: PathBuf,
    /// Sender metadata records, one per job
    pub metadata: PathBuf,
    /// Traced SVG documents, one per job
    pub svgs: PathBuf,
    /// Programs waiting to be plotted
    pub gcode: PathBuf,
    /// Programs that were plotted
    pub sent: PathBuf,
}

impl Default for FolderSettings {
    fn default() -> Self {
        Self {
            attachments: PathBuf::from("plotter_attachments"),
            metadata: PathBuf::from("plotter_metadata"),
            svgs: PathBuf::from("plotter_svgs"),
            gcode: PathBuf::from("plotter_gcode"),
            sent: PathBuf::from("sent_gcode"),
        }
    }
}

impl FolderSettings {
    /// Resolve relative folders against `base`
    pub fn rooted_at(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            attachments: join(&self.attachments),
            metadata: join(&self.metadata),
            svgs: join(&self.svgs),
            gcode: join(&self.gcode),
            sent: join(&self.sent),
        }
    }

    pub fn all(&self) -> [&Path; 5] {
        [
            &self.attachments,
            &self.metadata,
            &self.svgs,
            &self.gcode,
            &self.sent,
        ]
    }
}

/// Default external tracing command
pub const DEFAULT_VECTORIZER_COMMAND: &str = "vtracer";

/// Default number of passes over each drawing
pub const DEFAULT_PASSES: u32 = 2;

/// Complete plotter configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotterConfig {
    pub pen: PenSettings,
    pub plot_area: PlotArea,
    pub connection: ConnectionSettings,
    pub folders: FolderSettings,
    /// Program used to trace bitmaps into SVG
    pub vectorizer_command: String,
}

impl PlotterConfig {
    /// Build and validate a configuration from a flat settings map
    pub fn from_map(map: &SettingsMap) -> ConfigResult<Self> {
        let pen = PenSettings {
            down_position_mm: required(map, "pen_down_position_mm")?,
            travel_position_mm: required(map, "pen_travel_position_mm")?,
            feed_rate_mm_min: required(map, "pen_feed_rate_mm_min")?,
            passes: optional(map, "passes")?.unwrap_or(DEFAULT_PASSES),
            preamble_file: map.get("preamble_file").map(PathBuf::from),
            postamble_file: map.get("postamble_file").map(PathBuf::from),
        };

        let plot_area = PlotArea::new(
            required(map, "min_plot_x")?,
            required(map, "min_plot_y")?,
            required(map, "max_plot_x")?,
            required(map, "max_plot_y")?,
        )?;

        let connection = ConnectionSettings {
            usb_port: required::<String>(map, "usb_port")?,
            baud_rate: required(map, "baud_rate")?,
        };

        let defaults = FolderSettings::default();
        let folder = |key: &str, default: PathBuf| {
            map.get(key).map(PathBuf::from).unwrap_or(default)
        };
        let folders = FolderSettings {
            attachments: folder("attachments_folder", defaults.attachments),
            metadata: folder("metadata_folder", defaults.metadata),
            svgs: folder("svg_folder", defaults.svgs),
            gcode: folder("gcode_folder", defaults.gcode),
            sent: folder("sent_folder", defaults.sent),
        };

        let config = Self {
            pen,
            plot_area,
            connection,
            folders,
            vectorizer_command: map
                .get("vectorizer_command")
                .cloned()
                .unwrap_or_else(|| DEFAULT_VECTORIZER_COMMAND.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate values that parse fine but cannot drive a plotter
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.pen.feed_rate_mm_min > 0.0) {
            return Err(invalid("pen_feed_rate_mm_min", "must be > 0"));
        }

        if !self.pen.down_position_mm.is_finite() {
            return Err(invalid("pen_down_position_mm", "must be a finite number"));
        }

        if !self.pen.travel_position_mm.is_finite() {
            return Err(invalid("pen_travel_position_mm", "must be a finite number"));
        }

        if self.pen.down_position_mm == self.pen.travel_position_mm {
            return Err(invalid(
                "pen_travel_position_mm",
                "must differ from pen_down_position_mm",
            ));
        }

        if self.pen.passes == 0 {
            return Err(invalid("passes", "must be >= 1"));
        }

        if self.connection.usb_port.trim().is_empty() {
            return Err(invalid("usb_port", "must not be empty"));
        }

        if self.connection.baud_rate == 0 {
            return Err(invalid("baud_rate", "must be > 0"));
        }

        Ok(())
    }

    /// Load and validate a configuration file (TOML, JSON or INI)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = SettingsFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;
        let map = format.parse(&content)?;
        Ok(Self::from_map(&map)?)
    }

    /// Load a configuration file, writing the defaults first if it is missing
    pub fn load_or_create(path: &Path) -> SettingsResult<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }
        Self::load_from_file(path)
    }

    /// Write the default settings to `path`
    pub fn create_default_config(path: &Path) -> SettingsResult<()> {
        let format = SettingsFormat::from_path(path)?;
        let content = format.render(&Self::default_map())?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Created default configuration file: {}", path.display());
        Ok(())
    }

    /// Default settings as a flat map
    pub fn default_map() -> SettingsMap {
        [
            ("pen_down_position_mm", DEFAULT_PEN_DOWN_MM.to_string()),
            ("pen_travel_position_mm", DEFAULT_PEN_TRAVEL_MM.to_string()),
            ("pen_feed_rate_mm_min", DEFAULT_FEED_RATE_MM_MIN.to_string()),
            ("max_plot_x", DEFAULT_MAX_PLOT_X.to_string()),
            ("min_plot_x", DEFAULT_MIN_PLOT_X.to_string()),
            ("max_plot_y", DEFAULT_MAX_PLOT_Y.to_string()),
            ("min_plot_y", DEFAULT_MIN_PLOT_Y.to_string()),
            ("usb_port", DEFAULT_USB_PORT.to_string()),
            ("baud_rate", DEFAULT_BAUD_RATE.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// Flatten back to the key-value form
    pub fn to_map(&self) -> SettingsMap {
        let mut map = SettingsMap::new();
        let mut put = |k: &str, v: String| {
            map.insert(k.to_string(), v);
        };

        put("pen_down_position_mm", self.pen.down_position_mm.to_string());
        put(
            "pen_travel_position_mm",
            self.pen.travel_position_mm.to_string(),
        );
        put("pen_feed_rate_mm_min", self.pen.feed_rate_mm_min.to_string());
        put("passes", self.pen.passes.to_string());
        if let Some(p) = &self.pen.preamble_file {
            put("preamble_file", p.display().to_string());
        }
        if let Some(p) = &self.pen.postamble_file {
            put("postamble_file", p.display().to_string());
        }

        let area = &self.plot_area;
        put("min_plot_x", area.min().x.to_string());
        put("min_plot_y", area.min().y.to_string());
        put("max_plot_x", area.max().x.to_string());
        put("max_plot_y", area.max().y.to_string());

        put("usb_port", self.connection.usb_port.clone());
        put("baud_rate", self.connection.baud_rate.to_string());

        put("attachments_folder", self.folders.attachments.display().to_string());
        put("metadata_folder", self.folders.metadata.display().to_string());
        put("svg_folder", self.folders.svgs.display().to_string());
        put("gcode_folder", self.folders.gcode.display().to_string());
        put("sent_folder", self.folders.sent.display().to_string());
        put("vectorizer_command", self.vectorizer_command.clone());

        map
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn required<T>(map: &SettingsMap, key: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(map, key)?.ok_or_else(|| ConfigError::MissingKey(key.to_string()))
}

fn optional<T>(map: &SettingsMap, key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match map.get(key).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("'{}': {}", raw, e),
        }),
    }
}
