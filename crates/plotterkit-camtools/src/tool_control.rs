//! Tool control strategies
//!
//! A [`ToolControl`] is a value carrying three command builders: raise the
//! tool, lower the tool, and move while the tool is engaged. New tool types
//! are new values built from closures, not new types.

use std::fmt;
use std::sync::Arc;

type CommandFn = Arc<dyn Fn() -> String + Send + Sync>;
type MoveFn = Arc<dyn Fn(f64, f64) -> String + Send + Sync>;

/// Pluggable tool up / tool down / move command strategy
#[derive(Clone)]
pub struct ToolControl {
    name: String,
    tool_up: CommandFn,
    tool_down: CommandFn,
    move_to: MoveFn,
}

impl ToolControl {
    /// Build a strategy from arbitrary command builders
    pub fn new<U, D, M>(name: impl Into<String>, tool_up: U, tool_down: D, move_to: M) -> Self
    where
        U: Fn() -> String + Send + Sync + 'static,
        D: Fn() -> String + Send + Sync + 'static,
        M: Fn(f64, f64) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tool_up: Arc::new(tool_up),
            tool_down: Arc::new(tool_down),
            move_to: Arc::new(move_to),
        }
    }

    /// Pen plotter driven on the Z axis.
    ///
    /// The plunge depth is repeated on every cutting move so a controller
    /// that drops Z state between lines still keeps the pen down. The sign of
    /// both heights is taken as configured.
    pub fn pen(up_height: f64, down_depth: f64, feed_rate: f64) -> Self {
        Self::new(
            "pen",
            move || format!("G0 Z{:.2}", up_height),
            move || format!("G1 Z{:.2} F{}", down_depth, feed_rate),
            move |x, y| format!("G1 X{:.3} Y{:.3} Z{:.2}", x, y, down_depth),
        )
    }

    /// Laser head switched with M3/M5
    pub fn laser(power: f64, feed_rate: f64) -> Self {
        Self::new(
            "laser",
            || "M5".to_string(),
            move || format!("M3 S{}", power),
            move |x, y| format!("G1 X{:.3} Y{:.3} F{}", x, y, feed_rate),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tool_up(&self) -> String {
        (self.tool_up)()
    }

    pub fn tool_down(&self) -> String {
        (self.tool_down)()
    }

    pub fn move_to(&self, x: f64, y: f64) -> String {
        (self.move_to)(x, y)
    }
}

impl fmt::Debug for ToolControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolControl")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
