//! Image vectorization boundary
//!
//! Tracing a bitmap into vector paths is delegated to an external program.

use crate::error::{CamToolError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Turns a bitmap image into an SVG document
pub trait Vectorizer {
    fn vectorize(&self, image: &Path) -> Result<String>;
}

/// Runs a `vtracer`-compatible command line:
/// `<program> [args..] --input <image> --output <svg> --colormode bw`
#[derive(Debug, Clone)]
pub struct CommandVectorizer {
    program: String,
    args: Vec<String>,
}

impl CommandVectorizer {
    /// Build from a command string such as `vtracer` or `/opt/bin/vtracer --preset poster`
    pub fn new(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| {
            CamToolError::InvalidParameters("vectorizer command is empty".to_string())
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn output_path(image: &Path) -> PathBuf {
        image.with_extension("trace.svg")
    }
}

impl Vectorizer for CommandVectorizer {
    fn vectorize(&self, image: &Path) -> Result<String> {
        let output = Self::output_path(image);
        info!("Vectorizing {} with {}", image.display(), self.program);

        let result = Command::new(&self.program)
            .args(&self.args)
            .arg("--input")
            .arg(image)
            .arg("--output")
            .arg(&output)
            .args(["--colormode", "bw"])
            .output()
            .map_err(|e| CamToolError::Vectorizer(format!("failed to run {}: {}", self.program, e)))?;

        if !result.status.success() {
            let _ = fs::remove_file(&output);
            return Err(CamToolError::Vectorizer(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        let svg = fs::read_to_string(&output).map_err(|e| {
            CamToolError::Vectorizer(format!(
                "{} produced no readable output at {}: {}",
                self.program,
                output.display(),
                e
            ))
        })?;
        fs::remove_file(&output)?;
        debug!("Vectorizer produced {} bytes of SVG", svg.len());
        Ok(svg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        let v = CommandVectorizer::new("  vtracer --preset bw ").unwrap();
        assert_eq!(v.program(), "vtracer");
        assert_eq!(v.args, vec!["--preset".to_string(), "bw".to_string()]);
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            CommandVectorizer::new("   "),
            Err(CamToolError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_output_next_to_image() {
        assert_eq!(
            CommandVectorizer::output_path(Path::new("/tmp/in/cat.png")),
            PathBuf::from("/tmp/in/cat.trace.svg")
        );
    }

    #[test]
    fn test_missing_program_is_vectorizer_error() {
        let v = CommandVectorizer::new("plotterkit-no-such-tracer-binary").unwrap();
        let err = v.vectorize(Path::new("/nonexistent/image.png")).unwrap_err();
        assert!(matches!(err, CamToolError::Vectorizer(_)));
    }
}
