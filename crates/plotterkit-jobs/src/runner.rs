//! Job runner
//!
//! Runs one pending job end to end: stream its program, archive it, notify
//! the sender and clean up the companions.
//!
//! If streaming fails nothing is archived, notified or deleted: the job stays
//! pending and the next run retries it from the first line. Once the program
//! is archived the job counts as completed; a failed notification or cleanup
//! is only logged.

use crate::error::JobResult;
use crate::job::{JobState, PlotJob};
use crate::notify::{CompletionNotice, Notifier};
use crate::store::JobStore;
use plotterkit_camtools::program_lines;
use plotterkit_communication::{SerialLink, SerialResult, SerialSession, StreamReport};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Opens a fresh serial session per job
pub trait LinkFactory {
    fn open_session(&self) -> SerialResult<SerialSession>;
}

impl LinkFactory for SerialLink {
    fn open_session(&self) -> SerialResult<SerialSession> {
        self.open()
    }
}

/// What a completed job did
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub job: PlotJob,
    pub report: StreamReport,
    pub archived_to: PathBuf,
    pub notified: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No pending job
    Idle,
    Completed(JobSummary),
}

pub struct JobRunner<S: JobStore, L: LinkFactory> {
    store: S,
    links: L,
    notifier: Box<dyn Notifier>,
}

impl<S: JobStore, L: LinkFactory> JobRunner<S, L> {
    pub fn new(store: S, links: L, notifier: Box<dyn Notifier>) -> Self {
        Self {
            store,
            links,
            notifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Earliest pending job by program file name
    pub fn next_job(&self) -> JobResult<Option<PlotJob>> {
        Ok(self.store.pending_programs()?.into_iter().next())
    }

    /// Run the next pending job, if any
    pub fn run_once(&mut self) -> JobResult<RunOutcome> {
        let Some(mut job) = self.next_job()? else {
            info!("No pending programs");
            return Ok(RunOutcome::Idle);
        };

        info!("Starting job {}", job.name);
        let program = self.store.read_program(&job)?;
        job.recipient = match self.store.read_metadata(&job) {
            Ok(meta) => meta.map(|m| m.sender),
            Err(e) => {
                warn!("Ignoring metadata of {}: {}", job.name, e);
                None
            }
        };

        job.state = JobState::Streaming;
        let report = match self.stream(&program) {
            Ok(report) => report,
            Err(e) => {
                job.state = JobState::Failed;
                error!(
                    "Job {} failed (retryable: {}): {}",
                    job.name,
                    e.is_retryable(),
                    e
                );
                return Err(e);
            }
        };

        let archived_to = self.store.archive_program(&job)?;
        job.state = JobState::Completed;
        info!("Archived {} to {}", job.name, archived_to.display());

        let notified = self.notify(&job);

        if let Err(e) = self.store.remove_companions(&job) {
            warn!("Failed to remove companions of {}: {}", job.name, e);
        }

        Ok(RunOutcome::Completed(JobSummary {
            job,
            report,
            archived_to,
            notified,
        }))
    }

    /// Run jobs until none are pending or one fails
    pub fn run_all(&mut self) -> JobResult<Vec<JobSummary>> {
        let mut done = Vec::new();
        while let RunOutcome::Completed(summary) = self.run_once()? {
            done.push(summary);
        }
        Ok(done)
    }

    fn stream(&self, program: &str) -> JobResult<StreamReport> {
        let mut session = self.links.open_session()?;
        let report = session.stream(program_lines(program))?;
        session.close();
        Ok(report)
    }

    fn notify(&self, job: &PlotJob) -> bool {
        let Some(recipient) = job.recipient.clone() else {
            info!("No recipient for {}, skipping notification", job.name);
            return false;
        };

        let notice = CompletionNotice {
            recipient,
            program_name: job.name.clone(),
            svg_attachment: job.svg.clone(),
        };
        match self.notifier.notify(&notice) {
            Ok(()) => true,
            Err(e) => {
                warn!("Notification for {} failed: {}", job.name, e);
                false
            }
        }
    }
}
