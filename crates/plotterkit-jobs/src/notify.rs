//! Completion notifications

use crate::error::JobResult;
use std::path::PathBuf;
use tracing::info;

/// What a recipient is told when their plot is finished
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionNotice {
    pub recipient: String,
    /// Program file name, e.g. `cat.gcode`
    pub program_name: String,
    /// Traced SVG to attach, when one was kept
    pub svg_attachment: Option<PathBuf>,
}

impl CompletionNotice {
    pub fn subject(&self) -> String {
        format!("Plotter Job Complete: {}", self.program_name)
    }

    pub fn body(&self) -> String {
        let mut body = format!(
            "The plotter has successfully completed the print job for '{}'.",
            self.program_name
        );
        if self.svg_attachment.is_some() {
            body.push_str("\n\nThe traced SVG file is attached.");
        }
        body
    }
}

/// Delivers completion notices
pub trait Notifier {
    fn notify(&self, notice: &CompletionNotice) -> JobResult<()>;
}

/// Writes notices to the log instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &CompletionNotice) -> JobResult<()> {
        info!(
            recipient = %notice.recipient,
            attachment = ?notice.svg_attachment,
            "{}",
            notice.subject()
        );
        Ok(())
    }
}
