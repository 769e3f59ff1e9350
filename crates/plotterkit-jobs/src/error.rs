//! Error types for the jobs crate.

use plotterkit_camtools::CamToolError;
use plotterkit_communication::SerialError;
use plotterkit_core::GeometryError;
use plotterkit_settings::SettingsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running the plot pipeline
#[derive(Error, Debug)]
pub enum JobError {
    /// Opening the port or streaming to the controller failed.
    #[error(transparent)]
    Serial(#[from] SerialError),

    /// Settings could not be loaded or are invalid.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// A value needed by the pipeline is missing or unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The drawing could not be fitted.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Vectorizing, importing or compiling failed.
    #[error(transparent)]
    CamTool(#[from] CamToolError),

    /// Reading or moving a job file failed.
    #[error("Job store I/O failed on {}: {source}", .path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A companion metadata record is malformed.
    #[error("Invalid job metadata in {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Delivering a completion notice failed.
    #[error("Notification failed: {0}")]
    Notification(String),
}

impl JobError {
    pub(crate) fn store(path: impl Into<PathBuf>, source: io::Error) -> Self {
        JobError::Store {
            path: path.into(),
            source,
        }
    }

    /// Whether running the same job again may succeed without changes
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::Serial(SerialError::ConnectionFailed { .. })
            | JobError::Serial(SerialError::Protocol { .. }) => true,
            JobError::Store { .. } => true,
            JobError::CamTool(CamToolError::IoError(_)) => true,
            _ => false,
        }
    }
}

/// Result type for job operations
pub type JobResult<T> = Result<T, JobError>;
