//! # PlotterKit Core
//!
//! Core types shared by every PlotterKit crate:
//! - the drawing model (points, curves, drawings) with bounds and in-place transforms
//! - the plot area and the fit transform that maps a drawing into it
//! - geometry errors

pub mod constants;
pub mod error;
pub mod fit;
pub mod geometry;

pub use error::GeometryError;
pub use fit::{fit_to_area, fit_scale_factor, FitReport, PlotArea};
pub use geometry::{arc_angles, Bounds, Curve, Drawing, Point};
