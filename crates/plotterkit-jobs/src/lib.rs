//! # PlotterKit Jobs
//!
//! The plotting pipeline around the core fit and streaming logic:
//!
//! - [`intake`]: receive images from allowed senders
//! - [`convert`]: trace, fit and compile images into pending programs
//! - [`runner`]: stream one pending program and finalize it
//! - [`store`]: folder roles, on disk or in memory
//! - [`notify`]: completion notices

pub mod convert;
pub mod error;
pub mod intake;
pub mod job;
pub mod notify;
pub mod runner;
pub mod store;

pub use convert::{ConversionReport, Converter};
pub use error::{JobError, JobResult};
pub use intake::{save_attachments, AllowedSenders, DropFolderIntake, IncomingAttachment, JobIntake};
pub use job::{JobMetadata, JobState, PlotJob};
pub use notify::{CompletionNotice, LogNotifier, Notifier};
pub use runner::{JobRunner, JobSummary, LinkFactory, RunOutcome};
pub use store::{FsJobStore, JobStore, MemoryJobStore};
