//! Conversion jobs and their lifecycle.
//!
//! A job starts from the ordered `(path, original name)` pairs handed over
//! by the upload collaborator and moves through a small state machine:
//!
//! ```text
//! Pending -> Validating -> Assembling -> Writing -> Completed
//!    |           |             |           |
//!    +-----------+-------------+-----------+------> Failed
//! ```
//!
//! `Completed` and `Failed` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{ConvertError, Result};

/// One uploaded file as handed over by the upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSubmission {
    /// Temporary path of the already-persisted bytes.
    pub path: PathBuf,
    /// Name the file had on the client; its extension selects the render mode.
    pub original_name: String,
}

impl FileSubmission {
    /// Create a submission from a temporary path and the original file name.
    pub fn new(path: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            original_name: original_name.into(),
        }
    }

    /// Create a submission whose original name is the path's file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            original_name,
        }
    }
}

/// How an input file is drawn onto its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Flowed, wrapped and paginated text.
    Text,
    /// An image fitted into the page box.
    Image,
}

impl RenderMode {
    /// Extensions accepted by the router, lowercase with leading dot.
    pub const SUPPORTED_EXTENSIONS: [&'static str; 4] = [".txt", ".png", ".jpg", ".jpeg"];

    /// Route a file name to its render mode by extension (case-insensitive).
    ///
    /// Returns `None` for names without a recognized extension.
    pub fn for_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// A validated input file.
///
/// Only the [`FileValidator`](crate::validation::FileValidator) creates
/// these, so holding one proves the size and extension checks passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFile {
    path: PathBuf,
    original_name: String,
    size_bytes: u64,
    render_mode: RenderMode,
}

impl InputFile {
    pub(crate) fn new(
        submission: FileSubmission,
        size_bytes: u64,
        render_mode: RenderMode,
    ) -> Self {
        Self {
            path: submission.path,
            original_name: submission.original_name,
            size_bytes,
            render_mode,
        }
    }

    /// Temporary path of the input bytes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original client-side file name.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Size observed during validation.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Render mode derived from the original name.
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }
}

/// Unique identifier of a job, also used to name its artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// File name of the artifact produced for this job.
    pub fn artifact_name(&self) -> String {
        format!("{}.pdf", self.0)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Submitted, nothing checked yet.
    Pending,
    /// Input files are being checked.
    Validating,
    /// Pages are being rendered into the output.
    Assembling,
    /// The document trailer is being written and flushed.
    Writing,
    /// The artifact is complete.
    Completed,
    /// The job failed; any partial artifact has been cleaned up.
    Failed,
}

impl JobStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Validating)
                | (Pending, Failed)
                | (Validating, Assembling)
                | (Validating, Failed)
                | (Assembling, Writing)
                | (Assembling, Completed)
                | (Assembling, Failed)
                | (Writing, Completed)
                | (Writing, Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::Assembling => "assembling",
            Self::Writing => "writing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One request to combine an ordered list of files into one document.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    id: JobId,
    submissions: Vec<FileSubmission>,
    files: Vec<InputFile>,
    status: JobStatus,
}

impl ConversionJob {
    /// Create a pending job for the given submissions.
    pub fn new(submissions: Vec<FileSubmission>) -> Self {
        Self {
            id: JobId::new(),
            submissions,
            files: Vec::new(),
            status: JobStatus::Pending,
        }
    }

    /// Job identifier.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Submissions in page order.
    pub fn submissions(&self) -> &[FileSubmission] {
        &self.submissions
    }

    /// Validated files in page order; empty until validation succeeds.
    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    /// Move the job to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidTransition`] for illegal moves,
    /// including any move out of a terminal state.
    pub fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ConvertError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        tracing::debug!(job_id = %self.id, from = %self.status, to = %next, "job state change");
        self.status = next;
        Ok(())
    }

    /// Attach validated files and move to `Assembling`.
    ///
    /// # Errors
    ///
    /// Fails if the job is not validating or the files do not line up with
    /// the submissions.
    pub fn accept(&mut self, files: Vec<InputFile>) -> Result<()> {
        if files.len() != self.submissions.len() {
            return Err(ConvertError::other(format!(
                "Validated {} file(s) for a job of {} submission(s)",
                files.len(),
                self.submissions.len()
            )));
        }
        self.transition(JobStatus::Assembling)?;
        self.files = files;
        Ok(())
    }

    /// Mark the job failed unless it already reached a terminal state.
    pub(crate) fn fail(&mut self) {
        if !self.status.is_terminal() {
            self.status = JobStatus::Failed;
        }
    }
}
