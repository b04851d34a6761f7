//! Configuration for the conversion engine.
//!
//! A [`Config`] captures every knob a [`Converter`](crate::Converter) needs:
//! where artifacts land, the per-file size ceiling, the per-job file count
//! ceiling, document metadata, compression and validation concurrency.
//! Front ends (such as the CLI) build it from their own arguments and call
//! [`Config::validate`] before handing it over.

use anyhow::{Result, bail};

use crate::ConvertError;
use std::{path::PathBuf, str::FromStr};

/// Default per-file size ceiling: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of files accepted in one job.
pub const DEFAULT_MAX_FILES: usize = 10;

/// Default directory for generated documents.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Compression level for content and image streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Streams are written raw.
    None,
    /// Balanced compression - good trade-off between size and processing time.
    #[default]
    Standard,
    /// Maximum compression - smallest file size, longer processing time.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = crate::ConvertError;
    /// Parse compression level from string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a valid compression level.
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(ConvertError::InvalidConfig {
                message: format!(
                    "Invalid compression level: {s}. Must be one of: none, standard, maximum"
                ),
            }),
        }
    }
}

impl CompressionLevel {
    /// The flate2 level for this setting, or `None` when streams stay raw.
    pub fn flate_level(&self) -> Option<flate2::Compression> {
        match self {
            Self::None => None,
            Self::Standard => Some(flate2::Compression::default()),
            Self::Maximum => Some(flate2::Compression::best()),
        }
    }
}

/// Descriptive metadata written to the document Info dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Document title.
    pub title: String,
    /// Document author.
    pub author: String,
    /// Natural language of the document (BCP 47 tag).
    pub language: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: "Combined Documents".to_string(),
            author: "PDF Converter Service".to_string(),
            language: "en-US".to_string(),
        }
    }
}

impl DocumentMetadata {
    /// Override title and author, ignoring blank values.
    pub fn with_overrides(mut self, title: Option<String>, author: Option<String>) -> Self {
        let non_blank = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        if let Some(title) = non_blank(title) {
            self.title = title;
        }
        if let Some(author) = non_blank(author) {
            self.author = author;
        }
        self
    }
}

/// Complete configuration for a converter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory where generated documents are stored.
    pub output_dir: PathBuf,

    /// Largest accepted input file in bytes (inclusive).
    pub max_file_size: u64,

    /// Largest number of files accepted in one job.
    pub max_files: usize,

    /// Metadata written to every generated document.
    pub metadata: DocumentMetadata,

    /// Compression level for output streams.
    pub compression: CompressionLevel,

    /// Number of concurrent validation checks (None = auto-detect).
    pub validation_jobs: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_files: DEFAULT_MAX_FILES,
            metadata: DocumentMetadata::default(),
            compression: CompressionLevel::default(),
            validation_jobs: None,
        }
    }
}

impl Config {
    /// Create a configuration writing into `output_dir` with all other
    /// settings at their defaults.
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The size limit or file count limit is zero
    /// - The validation job count is zero
    /// - The output directory or title is empty
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            bail!("Maximum file size must be at least 1 byte");
        }

        if self.max_files == 0 {
            bail!("Maximum number of files must be at least 1");
        }

        if let Some(jobs) = self.validation_jobs
            && jobs == 0
        {
            bail!("Number of validation jobs must be at least 1");
        }

        if self.output_dir.as_os_str().is_empty() {
            bail!("Output directory cannot be empty");
        }

        if self.metadata.title.trim().is_empty() {
            bail!("Document title cannot be empty");
        }

        Ok(())
    }

    /// Get the effective number of concurrent validation checks.
    ///
    /// Returns the configured count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.validation_jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
