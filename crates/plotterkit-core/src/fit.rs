//! Plot area fitting
//!
//! Maps an arbitrarily sized drawing into the physical plot rectangle with a
//! uniform scale and a translation. Drawings are only ever shrunk, never
//! stretched, and always end up centered on the plot area.
//!
//! The order of operations matters: normalize to the drawing's own origin,
//! scale about that origin, then recenter using the bounds measured after
//! scaling.

use crate::error::GeometryError;
use crate::geometry::{Bounds, Drawing, Point};
use serde::Serialize;

/// Physical rectangle the device can safely draw within, in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotArea {
    min: Point,
    max: Point,
}

impl PlotArea {
    /// Create a plot area, rejecting empty or inverted ranges
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, GeometryError> {
        // Written so that NaN bounds fail too
        if !(max_x - min_x > 0.0) {
            return Err(GeometryError::InvalidPlotArea {
                axis: "x",
                min: min_x,
                max: max_x,
            });
        }
        if !(max_y - min_y > 0.0) {
            return Err(GeometryError::InvalidPlotArea {
                axis: "y",
                min: min_y,
                max: max_y,
            });
        }

        Ok(Self {
            min: Point::new(min_x, min_y),
            max: Point::new(max_x, max_y),
        })
    }

    pub fn min(&self) -> Point {
        self.min
    }

    pub fn max(&self) -> Point {
        self.max
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.max)
    }

    /// Whether `p` lies inside the area, allowing `epsilon` of slack
    pub fn contains(&self, p: Point, epsilon: f64) -> bool {
        p.x >= self.min.x - epsilon
            && p.x <= self.max.x + epsilon
            && p.y >= self.min.y - epsilon
            && p.y <= self.max.y + epsilon
    }
}

/// Summary of a fit, for logging and reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitReport {
    /// Uniform scale that was applied (1.0 when the drawing already fit)
    pub scale_factor: f64,
    /// Centering translation applied after scaling
    pub offset: Point,
    /// Bounds before fitting
    pub original_bounds: Bounds,
    /// Bounds after fitting
    pub fitted_bounds: Bounds,
}

impl FitReport {
    pub fn was_scaled(&self) -> bool {
        self.scale_factor != 1.0
    }
}

/// Compute the uniform scale needed to fit `bounds` inside `area`.
///
/// Returns exactly 1.0 when the drawing already fits on both axes. A zero
/// extent on one axis contributes a ratio of 1 for that axis.
pub fn fit_scale_factor(bounds: &Bounds, area: &PlotArea) -> Result<f64, GeometryError> {
    let plot_width = area.width();
    let plot_height = area.height();
    if !(plot_width > 0.0) || !(plot_height > 0.0) {
        return Err(GeometryError::InvalidPlotArea {
            axis: if plot_width > 0.0 { "y" } else { "x" },
            min: if plot_width > 0.0 { area.min.y } else { area.min.x },
            max: if plot_width > 0.0 { area.max.y } else { area.max.x },
        });
    }

    let drawing_width = bounds.width();
    let drawing_height = bounds.height();

    if drawing_width <= plot_width && drawing_height <= plot_height {
        return Ok(1.0);
    }

    let ratio_x = if drawing_width == 0.0 {
        1.0
    } else {
        plot_width / drawing_width
    };
    let ratio_y = if drawing_height == 0.0 {
        1.0
    } else {
        plot_height / drawing_height
    };

    Ok(ratio_x.min(ratio_y).min(1.0))
}

/// Scale (shrink only) and center `drawing` inside `area`, in place
pub fn fit_to_area(drawing: &mut Drawing, area: &PlotArea) -> Result<FitReport, GeometryError> {
    let original_bounds = drawing.bounds();
    if !original_bounds.is_finite() {
        return Err(GeometryError::NonFiniteDrawing);
    }

    let scale_factor = fit_scale_factor(&original_bounds, area)?;

    drawing.translate(-original_bounds.min.x, -original_bounds.min.y);
    drawing.scale(scale_factor);

    let scaled_center = drawing.bounds().center();
    let target = area.center();
    let offset = Point::new(target.x - scaled_center.x, target.y - scaled_center.y);
    drawing.translate(offset.x, offset.y);

    let fitted_bounds = drawing.bounds();
    tracing::debug!(
        "Fitted drawing {:.3}x{:.3} mm by factor {:.4} into {:.3}x{:.3} mm plot area",
        original_bounds.width(),
        original_bounds.height(),
        scale_factor,
        area.width(),
        area.height()
    );

    Ok(FitReport {
        scale_factor,
        offset,
        original_bounds,
        fitted_bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Curve;

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Drawing {
        let a = Point::new(min_x, min_y);
        let b = Point::new(max_x, min_y);
        let c = Point::new(max_x, max_y);
        let d = Point::new(min_x, max_y);
        Drawing::from_curves(vec![
            Curve::line(a, b),
            Curve::line(b, c),
            Curve::line(c, d),
            Curve::line(d, a),
        ])
    }

    #[test]
    fn test_plot_area_rejects_inverted_range() {
        assert!(matches!(
            PlotArea::new(210.0, 30.0, 30.0, 275.0),
            Err(GeometryError::InvalidPlotArea { axis: "x", .. })
        ));
        assert!(matches!(
            PlotArea::new(30.0, 30.0, 210.0, 30.0),
            Err(GeometryError::InvalidPlotArea { axis: "y", .. })
        ));
        assert!(PlotArea::new(0.0, 0.0, f64::NAN, 10.0).is_err());
    }

    #[test]
    fn test_double_size_drawing_halves() {
        let area = PlotArea::new(30.0, 30.0, 210.0, 275.0).unwrap();
        let mut drawing = rect(0.0, 0.0, 360.0, 490.0);

        let report = fit_to_area(&mut drawing, &area).unwrap();

        assert_eq!(report.scale_factor, 0.5);
        let center = report.fitted_bounds.center();
        assert!((center.x - 120.0).abs() < 1e-9);
        assert!((center.y - 152.5).abs() < 1e-9);
        assert!((report.fitted_bounds.width() - 180.0).abs() < 1e-9);
        assert!((report.fitted_bounds.height() - 245.0).abs() < 1e-9);
    }

    #[test]
    fn test_fitting_drawing_is_only_recentered() {
        let area = PlotArea::new(30.0, 30.0, 210.0, 275.0).unwrap();
        let mut drawing = rect(-500.0, 1000.0, -400.0, 1050.0);

        let report = fit_to_area(&mut drawing, &area).unwrap();

        assert_eq!(report.scale_factor, 1.0);
        assert!(!report.was_scaled());
        assert!((report.fitted_bounds.width() - 100.0).abs() < 1e-9);
        assert!((report.fitted_bounds.height() - 50.0).abs() < 1e-9);
        assert!((report.fitted_bounds.center().x - 120.0).abs() < 1e-9);
        assert!((report.fitted_bounds.center().y - 152.5).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_axis_uses_unit_ratio() {
        let area = PlotArea::new(0.0, 0.0, 100.0, 100.0).unwrap();

        // Horizontal line, too wide: only x limits the scale
        let mut drawing = Drawing::from_curves(vec![Curve::line(
            Point::new(0.0, 5.0),
            Point::new(400.0, 5.0),
        )]);
        let report = fit_to_area(&mut drawing, &area).unwrap();
        assert_eq!(report.scale_factor, 0.25);
        assert_eq!(report.fitted_bounds.height(), 0.0);
        assert!((report.fitted_bounds.center().y - 50.0).abs() < 1e-9);

        // Single point
        let mut drawing = Drawing::from_curves(vec![Curve::line(
            Point::new(7.0, 7.0),
            Point::new(7.0, 7.0),
        )]);
        let report = fit_to_area(&mut drawing, &area).unwrap();
        assert_eq!(report.scale_factor, 1.0);
        assert_eq!(report.fitted_bounds.min, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_empty_drawing_fits_without_error() {
        let area = PlotArea::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let mut drawing = Drawing::new();
        let report = fit_to_area(&mut drawing, &area).unwrap();
        assert_eq!(report.scale_factor, 1.0);
        assert!(drawing.is_empty());
    }

    #[test]
    fn test_non_finite_drawing_is_rejected() {
        let area = PlotArea::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let mut drawing = Drawing::from_curves(vec![Curve::line(
            Point::new(0.0, 0.0),
            Point::new(f64::INFINITY, 1.0),
        )]);
        assert_eq!(
            fit_to_area(&mut drawing, &area),
            Err(GeometryError::NonFiniteDrawing)
        );
    }
}
