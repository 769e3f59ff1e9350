//! Job storage
//!
//! The filesystem is the durable state of the pipeline: a program waiting in
//! the pending folder is a pending job, a program in the sent folder is done.
//! [`JobStore`] names the folder roles so the runner can be driven against an
//! in-memory store in tests.

use crate::error::{JobError, JobResult};
use crate::job::{job_stem, JobMetadata, PlotJob, PROGRAM_EXTENSION};
use plotterkit_settings::FolderSettings;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Folder roles used by the job runner
pub trait JobStore {
    /// Pending jobs sorted by program file name
    fn pending_programs(&self) -> JobResult<Vec<PlotJob>>;

    fn read_program(&self, job: &PlotJob) -> JobResult<String>;

    /// Move the program to the sent archive, returning its new location
    fn archive_program(&mut self, job: &PlotJob) -> JobResult<PathBuf>;

    /// Companion metadata, `None` when the job has none
    fn read_metadata(&self, job: &PlotJob) -> JobResult<Option<JobMetadata>>;

    /// Delete the companion SVG and metadata, if present
    fn remove_companions(&mut self, job: &PlotJob) -> JobResult<()>;
}

/// Directory-backed job store
#[derive(Debug, Clone)]
pub struct FsJobStore {
    folders: FolderSettings,
}

impl FsJobStore {
    pub fn new(folders: FolderSettings) -> Self {
        Self { folders }
    }

    pub fn folders(&self) -> &FolderSettings {
        &self.folders
    }

    /// Create every pipeline folder that does not exist yet
    pub fn ensure_folders(&self) -> JobResult<()> {
        for dir in self.folders.all() {
            fs::create_dir_all(dir).map_err(|e| JobError::store(dir, e))?;
        }
        Ok(())
    }

    fn svg_path(&self, stem: &str) -> PathBuf {
        self.folders.svgs.join(format!("{}.svg", stem))
    }

    fn metadata_path(&self, stem: &str) -> PathBuf {
        self.folders.metadata.join(format!("{}.json", stem))
    }
}

fn remove_if_present(path: &Path) -> JobResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(JobError::store(path, e)),
    }
}

impl JobStore for FsJobStore {
    fn pending_programs(&self) -> JobResult<Vec<PlotJob>> {
        let dir = &self.folders.gcode;
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(JobError::store(dir, e)),
        };

        let mut jobs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| JobError::store(dir, e))?;
            let path = entry.path();
            let is_program = path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case(PROGRAM_EXTENSION))
                    .unwrap_or(false);
            if !is_program {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };

            let mut job = PlotJob::new(name, path);
            let svg = self.svg_path(job.stem());
            let metadata = self.metadata_path(job.stem());
            job.svg = svg.exists().then_some(svg);
            job.metadata = metadata.exists().then_some(metadata);
            jobs.push(job);
        }

        jobs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(jobs)
    }

    fn read_program(&self, job: &PlotJob) -> JobResult<String> {
        fs::read_to_string(&job.program).map_err(|e| JobError::store(&job.program, e))
    }

    fn archive_program(&mut self, job: &PlotJob) -> JobResult<PathBuf> {
        let sent = &self.folders.sent;
        fs::create_dir_all(sent).map_err(|e| JobError::store(sent, e))?;
        let target = sent.join(&job.name);
        fs::rename(&job.program, &target).map_err(|e| JobError::store(&job.program, e))?;
        Ok(target)
    }

    fn read_metadata(&self, job: &PlotJob) -> JobResult<Option<JobMetadata>> {
        let path = self.metadata_path(job.stem());
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(JobError::store(path, e)),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| JobError::Metadata { path, source })
    }

    fn remove_companions(&mut self, job: &PlotJob) -> JobResult<()> {
        remove_if_present(&self.svg_path(job.stem()))?;
        remove_if_present(&self.metadata_path(job.stem()))
    }
}

/// In-memory job store
#[derive(Debug, Clone, Default)]
pub struct MemoryJobStore {
    pub pending: BTreeMap<String, String>,
    pub sent: BTreeMap<String, String>,
    pub svgs: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, JobMetadata>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a program, optionally with companions
    pub fn add_program(
        &mut self,
        name: &str,
        program: &str,
        svg: Option<&str>,
        sender: Option<&str>,
    ) {
        let stem = job_stem(name).to_string();
        self.pending.insert(name.to_string(), program.to_string());
        if let Some(svg) = svg {
            self.svgs.insert(stem.clone(), svg.to_string());
        }
        if let Some(sender) = sender {
            self.metadata.insert(
                stem,
                JobMetadata {
                    sender: sender.to_string(),
                },
            );
        }
    }

    fn missing(path: PathBuf) -> JobError {
        JobError::store(path, io::Error::new(io::ErrorKind::NotFound, "no such job"))
    }
}

impl JobStore for MemoryJobStore {
    fn pending_programs(&self) -> JobResult<Vec<PlotJob>> {
        // BTreeMap iteration is already sorted by name
        Ok(self
            .pending
            .keys()
            .map(|name| {
                let mut job = PlotJob::new(name.clone(), Path::new("memory/pending").join(name));
                let stem = job.stem().to_string();
                if self.svgs.contains_key(&stem) {
                    job.svg = Some(Path::new("memory/svgs").join(format!("{}.svg", stem)));
                }
                if self.metadata.contains_key(&stem) {
                    job.metadata = Some(Path::new("memory/metadata").join(format!("{}.json", stem)));
                }
                job
            })
            .collect())
    }

    fn read_program(&self, job: &PlotJob) -> JobResult<String> {
        self.pending
            .get(&job.name)
            .cloned()
            .ok_or_else(|| Self::missing(job.program.clone()))
    }

    fn archive_program(&mut self, job: &PlotJob) -> JobResult<PathBuf> {
        let program = self
            .pending
            .remove(&job.name)
            .ok_or_else(|| Self::missing(job.program.clone()))?;
        self.sent.insert(job.name.clone(), program);
        Ok(Path::new("memory/sent").join(&job.name))
    }

    fn read_metadata(&self, job: &PlotJob) -> JobResult<Option<JobMetadata>> {
        Ok(self.metadata.get(job.stem()).cloned())
    }

    fn remove_companions(&mut self, job: &PlotJob) -> JobResult<()> {
        self.svgs.remove(job.stem());
        self.metadata.remove(job.stem());
        Ok(())
    }
}
