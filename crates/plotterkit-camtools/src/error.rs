//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for program generation,
//! SVG import and image vectorization.

use std::io;
use thiserror::Error;

/// Errors that can occur during CAM tool operations.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// Invalid parameters were provided to a CAM tool.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// An SVG document could not be interpreted.
    #[error("SVG parse error: {0}")]
    SvgParse(String),

    /// The external vectorizer failed or produced no output.
    #[error("Vectorizer failed: {0}")]
    Vectorizer(String),

    /// A geometry operation failed.
    #[error("Geometry error: {0}")]
    Geometry(#[from] plotterkit_core::GeometryError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Result type for CAM tool operations.
pub type Result<T> = std::result::Result<T, CamToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cam_tool_error_display() {
        let err = CamToolError::InvalidParameters("passes must be at least 1".to_string());
        assert_eq!(err.to_string(), "Invalid parameters: passes must be at least 1");

        let err = CamToolError::Vectorizer("exit status 1".to_string());
        assert_eq!(err.to_string(), "Vectorizer failed: exit status 1");
    }

    #[test]
    fn test_geometry_error_converts() {
        let err: CamToolError = plotterkit_core::GeometryError::NonFiniteDrawing.into();
        assert!(matches!(err, CamToolError::Geometry(_)));
    }
}
