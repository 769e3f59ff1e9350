//! Error handling for PlotterKit
//!
//! Errors raised by the geometry layer. The crates built on top wrap
//! [`GeometryError`] in their own `thiserror` enums.

use thiserror::Error;

/// Geometry error type
///
/// Raised when a drawing or plot area cannot be used for fitting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The plot area has an empty or inverted range on one axis
    #[error("Invalid plot area: {axis} range {min}..{max} must have min < max")]
    InvalidPlotArea {
        /// Axis name ("x" or "y")
        axis: &'static str,
        /// Lower bound in mm
        min: f64,
        /// Upper bound in mm
        max: f64,
    },

    /// The drawing contains NaN or infinite coordinates
    #[error("Drawing contains non-finite coordinates")]
    NonFiniteDrawing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::InvalidPlotArea {
            axis: "x",
            min: 210.0,
            max: 30.0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid plot area: x range 210..30 must have min < max"
        );
    }
}
