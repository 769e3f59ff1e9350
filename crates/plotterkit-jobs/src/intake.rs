//! Image intake
//!
//! Incoming images arrive through a [`JobIntake`] source. Each accepted
//! image is saved to the attachments folder together with a metadata record
//! naming its sender, so the completion notice can find its way back.
//!
//! [`DropFolderIntake`] reads a drop directory laid out as
//! `<drop>/<sender address>/<image>`. Only subdirectories of allowed senders
//! are read, and only image files are taken. Fetching never removes anything:
//! drop files are deleted by [`JobIntake::acknowledge`], once the caller has
//! saved them.

use crate::error::{JobError, JobResult};
use crate::job::{job_stem, JobMetadata};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Accepted image extensions
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Case-insensitive check of a file name against [`IMAGE_EXTENSIONS`]
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|ok| e.eq_ignore_ascii_case(ok)))
        .unwrap_or(false)
}

/// One image received from a sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub sender: String,
}

/// Source of new images
pub trait JobIntake {
    fn fetch(&mut self) -> JobResult<Vec<IncomingAttachment>>;

    /// Mark fetched attachments as handled so they are not fetched again.
    /// Call only after they have been saved.
    fn acknowledge(&mut self, _received: &[IncomingAttachment]) -> JobResult<()> {
        Ok(())
    }
}

/// Sender addresses allowed to submit jobs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedSenders {
    addresses: BTreeSet<String>,
}

impl AllowedSenders {
    /// One address per line; blank lines are ignored
    pub fn parse(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Load the allow list; a missing file yields an empty list
    pub fn load(path: &Path) -> JobResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Sender file {} not found", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(JobError::store(path, e)),
        }
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(&address.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.addresses.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for AllowedSenders {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self {
            addresses: iter.into_iter().map(|a| a.trim().to_lowercase()).collect(),
        }
    }
}

/// Drop directory with one subdirectory per sender
#[derive(Debug, Clone)]
pub struct DropFolderIntake {
    root: PathBuf,
    allowed: AllowedSenders,
}

impl DropFolderIntake {
    pub fn new(root: impl Into<PathBuf>, allowed: AllowedSenders) -> Self {
        Self {
            root: root.into(),
            allowed,
        }
    }

    fn fetch_sender(&self, dir: &Path, sender: &str) -> JobResult<Vec<IncomingAttachment>> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .map_err(|e| JobError::store(dir, e))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();

        let mut attachments = Vec::new();
        for name in names {
            if !is_image_name(&name) {
                debug!("Skipping non-image file {} from {}", name, sender);
                continue;
            }
            let path = dir.join(&name);
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Leaving unreadable {} in place: {}", path.display(), e);
                    continue;
                }
            };
            attachments.push(IncomingAttachment {
                file_name: name,
                bytes,
                sender: sender.to_string(),
            });
        }
        Ok(attachments)
    }
}

impl JobIntake for DropFolderIntake {
    fn fetch(&mut self) -> JobResult<Vec<IncomingAttachment>> {
        if self.allowed.is_empty() {
            info!("No allowed senders configured");
            return Ok(Vec::new());
        }

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(JobError::store(&self.root, e)),
        };

        let mut senders: Vec<(String, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                Some((name, entry.path()))
            })
            .collect();
        senders.sort();

        let mut attachments = Vec::new();
        for (sender, dir) in senders {
            if !self.allowed.contains(&sender) {
                debug!("Ignoring drop folder of unknown sender {}", sender);
                continue;
            }
            attachments.extend(self.fetch_sender(&dir, &sender)?);
        }

        info!("Fetched {} attachments from {}", attachments.len(), self.root.display());
        Ok(attachments)
    }

    fn acknowledge(&mut self, received: &[IncomingAttachment]) -> JobResult<()> {
        for attachment in received {
            let path = self.root.join(&attachment.sender).join(&attachment.file_name);
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed {} from the drop folder", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(JobError::store(&path, e)),
            }
        }
        Ok(())
    }
}

/// Save attachments and their sender records.
///
/// Attachments from senders outside `allowed` or without an image extension
/// are dropped. Returns the paths of the saved images.
pub fn save_attachments(
    attachments: &[IncomingAttachment],
    allowed: &AllowedSenders,
    attachments_dir: &Path,
    metadata_dir: &Path,
) -> JobResult<Vec<PathBuf>> {
    for dir in [attachments_dir, metadata_dir] {
        fs::create_dir_all(dir).map_err(|e| JobError::store(dir, e))?;
    }

    let mut saved = Vec::new();
    for attachment in attachments {
        if !allowed.contains(&attachment.sender) {
            warn!("Rejected {} from {}: sender not allowed", attachment.file_name, attachment.sender);
            continue;
        }
        if !is_image_name(&attachment.file_name) {
            warn!("Rejected {}: not a supported image", attachment.file_name);
            continue;
        }
        // Never let a submitted name escape the attachments folder
        let Some(file_name) = Path::new(&attachment.file_name).file_name() else {
            continue;
        };

        let image_path = attachments_dir.join(file_name);
        fs::write(&image_path, &attachment.bytes).map_err(|e| JobError::store(&image_path, e))?;

        let stem = job_stem(&attachment.file_name);
        let metadata_path = metadata_dir.join(format!("{}.json", stem));
        let record = JobMetadata {
            sender: attachment.sender.clone(),
        };
        let json = serde_json::to_string(&record).map_err(|source| JobError::Metadata {
            path: metadata_path.clone(),
            source,
        })?;
        fs::write(&metadata_path, json).map_err(|e| JobError::store(&metadata_path, e))?;

        info!("Saved {} from {}", image_path.display(), attachment.sender);
        saved.push(image_path);
    }
    Ok(saved)
}
