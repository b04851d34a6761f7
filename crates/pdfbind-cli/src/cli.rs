//! CLI argument parsing for pdfbind.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pdfbind::config::{
    CompressionLevel, Config, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES, DEFAULT_OUTPUT_DIR,
    DocumentMetadata,
};
use pdfbind::error::{ConvertError, Result};
use pdfbind::job::FileSubmission;

/// Combine text and image files into a single PDF document.
///
/// Each input becomes a page (text files may flow onto several) in the
/// order given. The result is written to the output directory under a
/// fresh UUID file name.
#[derive(Parser, Debug)]
#[command(name = "pdfbind")]
#[command(version)]
#[command(about = "Combine text and image files into a single PDF document", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input files to convert (in page order)
    ///
    /// Supported types: .txt, .png, .jpg, .jpeg.
    /// Glob patterns are expanded in sorted order.
    ///
    /// Examples:
    ///   pdfbind notes.txt photo.jpg
    ///   pdfbind 'scans/*.png' -o out
    #[arg(value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Directory the generated PDF is written to
    ///
    /// Created if it does not exist.
    #[arg(
        short,
        long,
        value_name = "DIR",
        env = "PDFBIND_OUTPUT_DIR",
        default_value = DEFAULT_OUTPUT_DIR
    )]
    pub output_dir: PathBuf,

    /// Largest accepted input file, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Largest number of input files in one document
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_FILES)]
    pub max_files: usize,

    /// Set title metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Set author metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Compression level for output PDF
    ///
    /// - none: Raw streams
    /// - standard: Balanced compression (default)
    /// - maximum: Smallest output
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Read input files from a list (one per line)
    ///
    /// Each line is a path, optionally followed by a tab and the original
    /// file name to use for type detection. Lines starting with '#' are
    /// ignored. Use '-' to read from stdin. Listed files come after
    /// direct inputs.
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    /// Number of concurrent validation checks
    ///
    /// Default is number of CPU cores.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Verbose output - show each input and the resulting page layout
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Compression level is invalid
    /// - Configuration validation fails
    pub fn to_config(&self) -> Result<Config> {
        let compression = CompressionLevel::from_str(&self.compression)?;

        let metadata =
            DocumentMetadata::default().with_overrides(self.title.clone(), self.author.clone());

        let config = Config {
            output_dir: self.output_dir.clone(),
            max_file_size: self.max_file_size,
            max_files: self.max_files,
            metadata,
            compression,
            validation_jobs: self.jobs,
        };

        config.validate().map_err(|e| {
            ConvertError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    /// Validate CLI arguments before processing.
    ///
    /// # Errors
    ///
    /// Returns an error if no inputs are given at all or the job count is
    /// zero.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() && self.input_list.is_none() {
            return Err(ConvertError::invalid_config("No input files specified"));
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(ConvertError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        Ok(())
    }

    /// Collect all submissions: direct inputs first, then the input list.
    ///
    /// # Errors
    ///
    /// Returns an error if a glob pattern is invalid or the input list
    /// cannot be read.
    pub async fn get_all_submissions(&self) -> Result<Vec<FileSubmission>> {
        let mut submissions: Vec<FileSubmission> =
            pdfbind::utils::collect_paths_for_patterns(&self.inputs)?
                .into_iter()
                .map(FileSubmission::from_path)
                .collect();

        if let Some(ref input_list_path) = self.input_list {
            submissions.extend(read_input_list(input_list_path).await?);
        }

        Ok(submissions)
    }
}

/// Read submissions from a list file, or stdin for `-`.
async fn read_input_list(path: &Path) -> Result<Vec<FileSubmission>> {
    use tokio::io::AsyncReadExt;

    let read_error = |e| ConvertError::FailedToReadInput {
        name: "input list".to_string(),
        path: path.to_path_buf(),
        source: e,
    };

    let content = if path.as_os_str() == "-" {
        let mut content = String::new();
        tokio::io::stdin()
            .read_to_string(&mut content)
            .await
            .map_err(read_error)?;
        content
    } else {
        tokio::fs::read_to_string(path).await.map_err(read_error)?
    };

    Ok(parse_input_list(&content))
}

/// Parse input list lines: `path` or `path<TAB>original-name`.
///
/// Empty lines and lines starting with '#' are skipped.
pub fn parse_input_list(content: &str) -> Vec<FileSubmission> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once('\t') {
            Some((path, name)) if !name.trim().is_empty() => {
                FileSubmission::new(path.trim(), name.trim())
            }
            Some((path, _)) => FileSubmission::from_path(path.trim()),
            None => FileSubmission::from_path(line),
        })
        .collect()
}
