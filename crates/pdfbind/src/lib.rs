//! pdfbind - Combine text and image files into a single PDF document.
//!
//! This library takes an ordered batch of already-uploaded files and binds
//! them into one paginated document:
//!
//! - Concurrent validation of size, readability and file type
//! - Text files flowed in Helvetica with word wrapping and pagination
//! - PNG and JPEG images fitted and centered on their own page
//! - Incremental output written under a fresh UUID
//! - Automatic removal of partial output when a job fails
//!
//! # Examples
//!
//! ## Basic Conversion
//!
//! ```no_run
//! use pdfbind::config::Config;
//! use pdfbind::job::FileSubmission;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::with_output_dir("output");
//! let document = pdfbind::convert_files(
//!     config,
//!     vec![
//!         FileSubmission::new("/tmp/upload-1", "notes.txt"),
//!         FileSubmission::new("/tmp/upload-2", "photo.jpg"),
//!     ],
//! )
//! .await?;
//! println!("Created {} with {} pages", document.file_name, document.page_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Using a Converter With Custom Storage
//!
//! ```no_run
//! use pdfbind::{Config, Converter};
//! use pdfbind::job::{ConversionJob, FileSubmission};
//! use pdfbind::storage::FsStorage;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FsStorage::new("output");
//! storage.ensure_output_dir().await?;
//! let converter = Converter::new(Config::with_output_dir("output"), Arc::new(storage))?;
//!
//! let mut job = ConversionJob::new(vec![FileSubmission::from_path("a.txt")]);
//! let document = converter.run(&mut job).await?;
//! println!("Job {} is {}", job.id(), job.status());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assemble;
pub mod cleanup;
pub mod config;
pub mod converter;
pub mod error;
pub mod io;
pub mod job;
pub mod render;
pub mod storage;
pub mod utils;
pub mod validation;

use std::sync::Arc;

// Re-export commonly used types
pub use config::Config;
pub use converter::Converter;
pub use error::{ConvertError, Result};
pub use io::OutputDocument;
pub use job::{ConversionJob, FileSubmission, JobStatus};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Convert `submissions` into one PDF stored in `config.output_dir`.
///
/// Creates the output directory if needed.
///
/// # Errors
///
/// Returns [`ConvertError::InvalidConfig`] for a bad configuration,
/// [`ConvertError::FailedToCreateOutput`] if the output directory cannot be
/// created, and any error of [`Converter::run`].
pub async fn convert_files(
    config: Config,
    submissions: Vec<FileSubmission>,
) -> Result<OutputDocument> {
    let storage = storage::FsStorage::new(&config.output_dir);
    storage
        .ensure_output_dir()
        .await
        .map_err(|e| ConvertError::FailedToCreateOutput {
            path: config.output_dir.clone(),
            source: e,
        })?;

    Converter::new(config, Arc::new(storage))?
        .convert(submissions)
        .await
}
