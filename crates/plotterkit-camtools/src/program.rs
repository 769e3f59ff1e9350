//! Motion program compilation
//!
//! Turns a fitted [`Drawing`] into an ordered list of G-code lines using a
//! [`ToolControl`] strategy, and reads program text back into the command
//! lines that get streamed.

use crate::error::{CamToolError, Result};
use crate::flatten::{flatten_curve, DEFAULT_SEGMENT_LENGTH_MM};
use crate::tool_control::ToolControl;
use plotterkit_core::{Drawing, Point};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Curves whose start lies this close to the previous end continue the run
const CONTINUITY_EPSILON: f64 = 1e-6;

/// Settings for program compilation
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramSettings {
    /// Cutting feed rate in mm/min
    pub feed_rate: f64,
    /// Z position with the tool engaged
    pub tool_down_depth: f64,
    /// Z position for travel moves
    pub tool_up_height: f64,
    /// Lines emitted after the setup block
    pub preamble: Vec<String>,
    /// Lines emitted at the end of the program
    pub postamble: Vec<String>,
    /// How many times the whole drawing is traced
    pub passes: u32,
    /// Maximum length of a flattened segment in mm
    pub segment_length: f64,
    /// Optional title written into the header
    pub title: Option<String>,
}

impl Default for ProgramSettings {
    fn default() -> Self {
        Self {
            feed_rate: 1000.0,
            tool_down_depth: 0.0,
            tool_up_height: 5.0,
            preamble: Vec::new(),
            postamble: Vec::new(),
            passes: 2,
            segment_length: DEFAULT_SEGMENT_LENGTH_MM,
            title: None,
        }
    }
}

impl ProgramSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.feed_rate.is_finite() && self.feed_rate > 0.0) {
            return Err(CamToolError::InvalidParameters(format!(
                "feed rate must be positive, got {}",
                self.feed_rate
            )));
        }
        if self.passes == 0 {
            return Err(CamToolError::InvalidParameters(
                "passes must be at least 1".to_string(),
            ));
        }
        if !(self.segment_length.is_finite() && self.segment_length > 0.0) {
            return Err(CamToolError::InvalidParameters(format!(
                "segment length must be positive, got {}",
                self.segment_length
            )));
        }
        Ok(())
    }

    /// Pen strategy built from these settings
    pub fn pen_strategy(&self) -> ToolControl {
        ToolControl::pen(self.tool_up_height, self.tool_down_depth, self.feed_rate)
    }
}

/// A compiled motion program, one command or comment per line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionProgram {
    lines: Vec<String>,
}

impl MotionProgram {
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Every line including header comments
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Only the lines that will be sent to the controller
    pub fn commands(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(String::as_str).filter(|l| is_command(l))
    }

    pub fn command_count(&self) -> usize {
        self.commands().count()
    }

    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }
}

/// Compile a drawing into a motion program.
///
/// Each pass traces every curve in order. A new run starts with the tool
/// raised, a rapid move to the run start and the tool lowered; curves that
/// begin where the previous one ended continue without lifting.
pub fn compile(
    drawing: &Drawing,
    settings: &ProgramSettings,
    tool: &ToolControl,
) -> Result<MotionProgram> {
    settings.validate()?;

    let mut lines = header(drawing, settings, tool);
    lines.push("G21".to_string());
    lines.push("G90".to_string());
    lines.extend(settings.preamble.iter().cloned());
    lines.push(tool.tool_up());

    for pass in 0..settings.passes {
        if settings.passes > 1 {
            lines.push(format!("; Pass {} of {}", pass + 1, settings.passes));
        }

        let mut position: Option<Point> = None;
        let mut tool_is_down = false;

        for curve in drawing.curves() {
            let start = curve.start();
            let continues = position
                .map(|p| p.distance_to(&start) <= CONTINUITY_EPSILON)
                .unwrap_or(false);

            if !continues {
                if tool_is_down {
                    lines.push(tool.tool_up());
                }
                lines.push(format!("G0 X{:.3} Y{:.3}", start.x, start.y));
                lines.push(tool.tool_down());
                tool_is_down = true;
            }

            for p in flatten_curve(curve, settings.segment_length) {
                lines.push(tool.move_to(p.x, p.y));
            }
            position = Some(curve.end());
        }

        if tool_is_down {
            lines.push(tool.tool_up());
        }
    }

    lines.extend(settings.postamble.iter().cloned());

    let program = MotionProgram::from_lines(lines);
    debug!(
        "Compiled {} curves into {} commands ({} passes, {})",
        drawing.len(),
        program.command_count(),
        settings.passes,
        tool.name()
    );
    Ok(program)
}

fn header(drawing: &Drawing, settings: &ProgramSettings, tool: &ToolControl) -> Vec<String> {
    let mut lines = vec![format!(
        "; {}",
        settings.title.as_deref().unwrap_or("PlotterKit motion program")
    )];
    lines.push(format!(
        "; Generated: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(format!("; Tool: {}", tool.name()));
    lines.push(format!("; Feed rate: {:.0} mm/min", settings.feed_rate));
    lines.push(format!(
        "; Tool up: {:.2} mm, tool down: {:.2} mm",
        settings.tool_up_height, settings.tool_down_depth
    ));
    lines.push(format!("; Passes: {}", settings.passes));
    lines.push(format!("; Curves: {}", drawing.len()));
    lines
}

fn is_command(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with(';')
}

/// Command lines of program text: trimmed, with blank lines and `;`
/// comment lines dropped.
pub fn program_lines(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.lines().map(str::trim).filter(|l| is_command(l))
}

/// Read a preamble or postamble file.
///
/// A missing file yields an empty block.
pub fn load_block(path: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(program_lines(&text).map(str::to_string).collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("{} not found, using an empty block", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}
