//! Input validation for pdfbind.
//!
//! Every submitted file is checked before any output exists:
//! - The original name must carry a supported extension
//! - The file must exist and be readable
//! - Its size must not exceed the configured ceiling (inclusive)
//!
//! Checks are independent metadata reads and run concurrently. Results are
//! evaluated in submission order, so the error reported for a batch is
//! always that of the lowest failing index.
//!
//! # Examples
//!
//! ```no_run
//! use pdfbind::job::FileSubmission;
//! use pdfbind::storage::FsStorage;
//! use pdfbind::validation::FileValidator;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Arc::new(FsStorage::new("output"));
//! let validator = FileValidator::new(storage, 10 * 1024 * 1024, 10);
//! let summary = validator
//!     .validate_files(&[FileSubmission::new("/tmp/upload-1", "notes.txt")])
//!     .await?;
//! println!("{} file(s), {}", summary.files_validated, summary.format_total_size());
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{ConvertError, Result};
use crate::job::{FileSubmission, InputFile, RenderMode};
use crate::storage::Storage;
use crate::utils::format_file_size;

/// Summary of a successfully validated batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    /// Validated files in submission order.
    pub files: Vec<InputFile>,

    /// Total input size in bytes.
    pub total_size: u64,

    /// Number of files that passed validation.
    pub files_validated: usize,
}

impl ValidationSummary {
    /// Create a summary from validated files.
    pub fn from_files(files: Vec<InputFile>) -> Self {
        let total_size = files.iter().map(InputFile::size_bytes).sum();
        let files_validated = files.len();

        Self {
            files,
            total_size,
            files_validated,
        }
    }

    /// Format the total file size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Validator for submitted input files.
#[derive(Debug, Clone)]
pub struct FileValidator {
    storage: Arc<dyn Storage>,
    max_file_size: u64,
    max_files: usize,
    workers: usize,
}

impl FileValidator {
    /// Create a validator with the given limits.
    ///
    /// Concurrency defaults to the number of available CPU cores.
    pub fn new(storage: Arc<dyn Storage>, max_file_size: u64, max_files: usize) -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            storage,
            max_file_size,
            max_files,
            workers,
        }
    }

    /// Set the maximum number of concurrent checks.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Check batch-level constraints: at least one file, at most `max_files`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::NoFiles`] or [`ConvertError::TooManyFiles`].
    pub fn check_batch(&self, submissions: &[FileSubmission]) -> Result<()> {
        if submissions.is_empty() {
            return Err(ConvertError::NoFiles);
        }
        if submissions.len() > self.max_files {
            return Err(ConvertError::TooManyFiles {
                count: submissions.len(),
                max: self.max_files,
            });
        }
        Ok(())
    }

    /// Validate a single submission.
    ///
    /// The extension is checked first so unsupported files are rejected
    /// without touching storage.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The extension is not supported
    /// - The file does not exist or cannot be read
    /// - The file is larger than the size ceiling
    #[tracing::instrument(skip(self, submission), fields(name = %submission.original_name))]
    pub async fn validate_file(
        &self,
        index: usize,
        submission: &FileSubmission,
    ) -> Result<InputFile> {
        let render_mode = RenderMode::for_file_name(&submission.original_name).ok_or_else(
            || ConvertError::unsupported_file_type(index, &submission.original_name),
        )?;

        let size = self.storage.size(&submission.path).await.map_err(|e| {
            ConvertError::file_unreadable(
                index,
                &submission.original_name,
                submission.path.clone(),
                e,
            )
        })?;

        if size > self.max_file_size {
            return Err(ConvertError::file_too_large(
                index,
                &submission.original_name,
                size,
                self.max_file_size,
            ));
        }

        tracing::debug!(size, mode = %render_mode, "file accepted");
        Ok(InputFile::new(submission.clone(), size, render_mode))
    }

    /// Validate every submission concurrently.
    ///
    /// All checks run to completion before results are inspected; the
    /// first failure in submission order is returned.
    ///
    /// # Errors
    ///
    /// Returns the batch-level error from [`check_batch`], or the error of
    /// the lowest failing index.
    ///
    /// [`check_batch`]: FileValidator::check_batch
    pub async fn validate_files(
        &self,
        submissions: &[FileSubmission],
    ) -> Result<ValidationSummary> {
        self.check_batch(submissions)?;

        let tasks = submissions
            .iter()
            .enumerate()
            .map(|(idx, submission)| async move {
                let result = self.validate_file(idx, submission).await;
                (idx, result)
            });

        let mut indexed_results: Vec<(usize, Result<InputFile>)> = stream::iter(tasks)
            .buffer_unordered(self.workers)
            .collect::<Vec<_>>()
            .await;

        // Sort by original index to maintain order
        indexed_results.sort_by_key(|(idx, _)| *idx);

        let mut files = Vec::with_capacity(submissions.len());
        for (_, result) in indexed_results {
            files.push(result?);
        }

        Ok(ValidationSummary::from_files(files))
    }
}
