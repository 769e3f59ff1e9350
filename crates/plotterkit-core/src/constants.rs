//! Shared constants for PlotterKit

/// Tolerance used when checking that fitted geometry lies inside the plot area
pub const FIT_EPSILON: f64 = 1e-6;

/// Default plot area bounds in millimetres (A4 portrait with a 30 mm margin)
pub const DEFAULT_MIN_PLOT_X: f64 = 30.0;
pub const DEFAULT_MAX_PLOT_X: f64 = 210.0;
pub const DEFAULT_MIN_PLOT_Y: f64 = 30.0;
pub const DEFAULT_MAX_PLOT_Y: f64 = 275.0;

/// Default pen heights in millimetres
pub const DEFAULT_PEN_DOWN_MM: f64 = 0.0;
pub const DEFAULT_PEN_TRAVEL_MM: f64 = 5.0;

/// Default drawing feed rate in mm/min
pub const DEFAULT_FEED_RATE_MM_MIN: f64 = 1000.0;

/// Default serial settings
pub const DEFAULT_USB_PORT: &str = "/dev/ttyAMA10";
pub const DEFAULT_BAUD_RATE: u32 = 115200;
