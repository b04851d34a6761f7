//! Error types for pdfbind.
//!
//! Every failure a conversion job can surface is a [`ConvertError`]. Errors
//! fall into a small number of categories that drive how the job reacts:
//!
//! - **Validation**: raised before any output exists; no cleanup is needed.
//! - **Assembly**: malformed input content discovered while rendering.
//! - **I/O**: reading inputs or writing the output document failed.
//! - **Config**: the converter was configured with invalid settings.
//! - **Internal**: broken invariants inside the engine itself.

use std::io;
use std::path::PathBuf;

use crate::job::{JobStatus, RenderMode};

/// Result type alias for pdfbind operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Broad classification of a [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Input rejected before assembly started.
    Validation,
    /// Input content could not be rendered.
    Assembly,
    /// Reading or writing bytes failed.
    Io,
    /// Invalid converter configuration.
    Config,
    /// Engine invariant violated.
    Internal,
}

/// Main error type for conversion jobs.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The job was submitted without any files.
    #[error("No input files were submitted for conversion")]
    NoFiles,

    /// The job exceeds the per-request file count limit.
    #[error("Too many input files: {count} submitted, at most {max} allowed")]
    TooManyFiles {
        /// Number of files submitted.
        count: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// An input file is larger than the configured maximum.
    #[error(
        "File size exceeds maximum limit: {name} is {size} bytes\n  Limit: {limit} bytes"
    )]
    FileTooLarge {
        /// Position of the file in the submission.
        index: usize,
        /// Original file name.
        name: String,
        /// Actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// An input file does not exist or cannot be read.
    #[error("Invalid file: {name} ({})\n  Reason: {source}", .path.display())]
    FileUnreadable {
        /// Position of the file in the submission.
        index: usize,
        /// Original file name.
        name: String,
        /// Temporary path handed over by the upload collaborator.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file extension does not map to a render mode.
    #[error(
        "Unsupported file type: {name}\n  Supported extensions: {}",
        RenderMode::SUPPORTED_EXTENSIONS.join(", ")
    )]
    UnsupportedFileType {
        /// Position of the file in the submission.
        index: usize,
        /// Original file name.
        name: String,
    },

    /// Content could not be decoded or rendered.
    #[error("Failed to render {name}\n  Reason: {reason}")]
    MalformedContent {
        /// Original file name.
        name: String,
        /// What went wrong.
        reason: String,
    },

    /// An input disappeared or became unreadable after validation.
    #[error("Failed to read input file: {name} ({})\n  Reason: {source}", .path.display())]
    FailedToReadInput {
        /// Original file name.
        name: String,
        /// Temporary path of the input.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The output artifact could not be created.
    #[error("Failed to create output file: {}\n  Reason: {source}", .path.display())]
    FailedToCreateOutput {
        /// Path where the output should have been created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Writing to the output artifact failed.
    #[error("Failed to write to output file: {}\n  Reason: {source}", .path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// The job was asked to move between incompatible states.
    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidTransition {
        /// State the job was in.
        from: JobStatus,
        /// Requested state.
        to: JobStatus,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl ConvertError {
    /// Create a FileTooLarge error.
    pub fn file_too_large(index: usize, name: impl Into<String>, size: u64, limit: u64) -> Self {
        Self::FileTooLarge {
            index,
            name: name.into(),
            size,
            limit,
        }
    }

    /// Create a FileUnreadable error.
    pub fn file_unreadable(
        index: usize,
        name: impl Into<String>,
        path: PathBuf,
        source: io::Error,
    ) -> Self {
        Self::FileUnreadable {
            index,
            name: name.into(),
            path,
            source,
        }
    }

    /// Create an UnsupportedFileType error.
    pub fn unsupported_file_type(index: usize, name: impl Into<String>) -> Self {
        Self::UnsupportedFileType {
            index,
            name: name.into(),
        }
    }

    /// Create a MalformedContent error.
    pub fn malformed_content(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedContent {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoFiles
            | Self::TooManyFiles { .. }
            | Self::FileTooLarge { .. }
            | Self::FileUnreadable { .. }
            | Self::UnsupportedFileType { .. } => ErrorCategory::Validation,
            Self::MalformedContent { .. } => ErrorCategory::Assembly,
            Self::FailedToReadInput { .. }
            | Self::FailedToCreateOutput { .. }
            | Self::FailedToWrite { .. }
            | Self::Io { .. } => ErrorCategory::Io,
            Self::InvalidConfig { .. } => ErrorCategory::Config,
            Self::InvalidTransition { .. } | Self::Other { .. } => ErrorCategory::Internal,
        }
    }

    /// Whether the error was raised before any output artifact existed.
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    /// Index of the offending input file, for per-file errors.
    pub fn file_index(&self) -> Option<usize> {
        match self {
            Self::FileTooLarge { index, .. }
            | Self::FileUnreadable { index, .. }
            | Self::UnsupportedFileType { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Validation => 2,
            ErrorCategory::Assembly => 3,
            ErrorCategory::Io => 5,
            ErrorCategory::Config => 1,
            ErrorCategory::Internal => 70,
        }
    }
}
