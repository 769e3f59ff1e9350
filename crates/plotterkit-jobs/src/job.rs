//! Plot job model

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension of pending motion program files
pub const PROGRAM_EXTENSION: &str = "gcode";

/// Lifecycle of one physical run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Streaming,
    Completed,
    Failed,
}

/// One pending motion program and its companion files
#[derive(Debug, Clone, PartialEq)]
pub struct PlotJob {
    /// Program file name, e.g. `cat.gcode`
    pub name: String,
    pub program: PathBuf,
    /// Traced SVG kept for the completion notice
    pub svg: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    /// Who to notify once the plot is done
    pub recipient: Option<String>,
    pub state: JobState,
}

impl PlotJob {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            svg: None,
            metadata: None,
            recipient: None,
            state: JobState::Pending,
        }
    }

    /// File name without extension; companions share it
    pub fn stem(&self) -> &str {
        job_stem(&self.name)
    }
}

pub(crate) fn job_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Companion record written at intake, e.g. `{"sender": "ada@example.com"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub sender: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem() {
        let job = PlotJob::new("cat.photo.gcode", "plotter_gcode/cat.photo.gcode");
        assert_eq!(job.stem(), "cat.photo");
        assert_eq!(job.state, JobState::Pending);
    }

    #[test]
    fn test_metadata_format() {
        let meta: JobMetadata = serde_json::from_str(r#"{"sender": "ada@example.com"}"#).unwrap();
        assert_eq!(meta.sender, "ada@example.com");
        assert_eq!(
            serde_json::to_string(&meta).unwrap(),
            r#"{"sender":"ada@example.com"}"#
        );
    }
}
