//! Job orchestration.
//!
//! The [`Converter`] drives one [`ConversionJob`] through validation,
//! assembly and writing, and owns the job's state transitions. Failures
//! after the artifact was created always pass through the
//! [`CleanupManager`] before the error reaches the caller.

use std::sync::Arc;

use crate::assemble::DocumentAssembler;
use crate::cleanup::CleanupManager;
use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::io::{OutputDocument, OutputWriter, PdfSink};
use crate::job::{ConversionJob, FileSubmission, JobStatus};
use crate::storage::Storage;
use crate::validation::FileValidator;

/// Converts batches of text and image files into single PDF documents.
///
/// A converter holds no per-job state and can run many jobs concurrently.
#[derive(Debug, Clone)]
pub struct Converter {
    config: Config,
    validator: FileValidator,
    assembler: DocumentAssembler,
    writer: OutputWriter,
    cleanup: CleanupManager,
}

impl Converter {
    /// Create a converter using `storage` for all byte access.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidConfig`] if the configuration does not
    /// validate.
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ConvertError::invalid_config(e.to_string()))?;

        let validator = FileValidator::new(
            Arc::clone(&storage),
            config.max_file_size,
            config.max_files,
        )
        .with_workers(config.effective_jobs());
        let assembler = DocumentAssembler::new(Arc::clone(&storage));
        let writer = OutputWriter::new(
            Arc::clone(&storage),
            config.compression,
            config.metadata.clone(),
        );
        let cleanup = CleanupManager::new(storage);

        Ok(Self {
            config,
            validator,
            assembler,
            writer,
            cleanup,
        })
    }

    /// The configuration this converter was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert `submissions`, in order, into one document.
    ///
    /// # Errors
    ///
    /// See [`Converter::run`].
    pub async fn convert(&self, submissions: Vec<FileSubmission>) -> Result<OutputDocument> {
        let mut job = ConversionJob::new(submissions);
        self.run(&mut job).await
    }

    /// Run a pending job to completion.
    ///
    /// On success the job is `Completed` and the artifact belongs to the
    /// caller. On failure the job is `Failed`, no artifact remains (unless
    /// deleting it failed, which is logged), and the error is the one that
    /// caused the failure.
    ///
    /// # Errors
    ///
    /// Returns validation errors before any output exists, or the read,
    /// render or write error that aborted assembly.
    #[tracing::instrument(skip_all, fields(job_id = %job.id(), files = job.submissions().len()))]
    pub async fn run(&self, job: &mut ConversionJob) -> Result<OutputDocument> {
        match self.execute(job).await {
            Ok(document) => {
                tracing::info!(
                    file = %document.file_name,
                    pages = document.page_count,
                    size = %document.format_size(),
                    "PDF generated"
                );
                Ok(document)
            }
            Err(e) => {
                job.fail();
                tracing::error!(error = %e, status = %job.status(), "PDF conversion failed");
                Err(e)
            }
        }
    }

    async fn execute(&self, job: &mut ConversionJob) -> Result<OutputDocument> {
        if job.status() != JobStatus::Pending {
            return Err(ConvertError::InvalidTransition {
                from: job.status(),
                to: JobStatus::Validating,
            });
        }

        if let Err(e) = self.validator.check_batch(job.submissions()) {
            job.transition(JobStatus::Failed)?;
            return Err(e);
        }

        job.transition(JobStatus::Validating)?;
        let summary = self.validator.validate_files(job.submissions()).await?;
        tracing::debug!(
            files = summary.files_validated,
            total_size = %summary.format_total_size(),
            "inputs validated"
        );
        job.accept(summary.files)?;

        let sink = self.writer.open(job.id()).await?;
        let path = sink.path().to_path_buf();

        match self.write_document(job, sink).await {
            Ok(document) => {
                job.transition(JobStatus::Completed)?;
                Ok(document)
            }
            Err(e) => {
                self.cleanup.discard(&path).await;
                Err(e)
            }
        }
    }

    async fn write_document(
        &self,
        job: &mut ConversionJob,
        mut sink: PdfSink,
    ) -> Result<OutputDocument> {
        let stats = self.assembler.assemble(job.files(), &mut sink).await?;
        tracing::debug!(
            pages = stats.total_pages,
            page_breaks = stats.page_breaks,
            input_size = %stats.format_input_size(),
            elapsed_ms = stats.assembly_time.as_millis() as u64,
            "document assembled"
        );

        job.transition(JobStatus::Writing)?;
        sink.finish().await
    }
}
