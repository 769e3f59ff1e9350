//! # PlotterKit
//!
//! Turns images into pen plots on a GRBL controller:
//! - intake of images from allowed senders
//! - tracing to SVG, fitting to the plot area, compiling to G-code
//! - lock-step streaming over a serial link with completion notices
//!
//! ## Architecture
//!
//! PlotterKit is organized as a workspace with multiple crates:
//!
//! 1. **plotterkit-core** - Drawing model, plot area fitting, geometry errors
//! 2. **plotterkit-settings** - Configuration loading and validation
//! 3. **plotterkit-camtools** - Tool control, program compiler, SVG import, vectorizer
//! 4. **plotterkit-communication** - Serial link and GRBL acknowledgments
//! 5. **plotterkit-jobs** - Intake, conversion, job store and runner
//! 6. **plotterkit** - CLI binary that wires the crates together

pub mod commands;

pub use plotterkit_core::{
    fit_scale_factor, fit_to_area, Bounds, Curve, Drawing, FitReport, GeometryError, PlotArea,
    Point,
};

pub use plotterkit_settings::{
    ConnectionSettings, FolderSettings, PenSettings, PlotterConfig, SettingsError,
};

pub use plotterkit_camtools::{
    compile, import_svg, program_lines, CamToolError, CommandVectorizer, MotionProgram,
    ProgramSettings, ToolControl, Vectorizer,
};

pub use plotterkit_communication::{
    list_ports, Ack, SerialError, SerialLink, SerialPortInfo, SerialSession, StreamReport,
};

pub use plotterkit_jobs::{
    AllowedSenders, Converter, DropFolderIntake, FsJobStore, JobError, JobRunner, JobStore,
    LogNotifier, Notifier, PlotJob, RunOutcome,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// One JSON object per event, for log collectors
    Json,
}

/// Initialize logging
///
/// Sets up structured logging with:
/// - Console output in the chosen format
/// - RUST_LOG environment variable support (INFO by default)
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .pretty();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .json();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}
