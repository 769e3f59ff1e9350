//! # PlotterKit CAM Tools
//!
//! Everything between a traced image and a motion program:
//!
//! - **Tool control**: pluggable tool up / tool down / move command strategies
//! - **Program compiler**: drawing to G-code lines, with passes, preamble and postamble
//! - **Curve flattening**: arcs and cubics to line moves
//! - **SVG import**: path and basic shape elements to a drawing
//! - **Vectorizer**: external bitmap tracer boundary

pub mod error;
pub mod flatten;
pub mod program;
pub mod svg_import;
pub mod tool_control;
pub mod vectorizer;

pub use error::{CamToolError, Result};
pub use flatten::{flatten_curve, DEFAULT_SEGMENT_LENGTH_MM};
pub use program::{compile, load_block, program_lines, MotionProgram, ProgramSettings};
pub use svg_import::import_svg;
pub use tool_control::ToolControl;
pub use vectorizer::{CommandVectorizer, Vectorizer};
