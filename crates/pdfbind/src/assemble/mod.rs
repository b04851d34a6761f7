//! Document assembly.
//!
//! The assembler walks the validated files of a job in order, renders each
//! one and appends its pages to a [`PdfSink`]. Assembly is strictly
//! sequential: file *i + 1* is not read until every page of file *i* has
//! been handed to the sink.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ConvertError, Result};
use crate::io::{PageSpan, PdfSink};
use crate::job::{InputFile, RenderMode};
use crate::render::{PageContent, render_image, render_text};
use crate::storage::Storage;
use crate::utils::format_file_size;

/// Statistics about an assembly run.
#[derive(Debug, Clone)]
pub struct AssemblyStatistics {
    /// Number of input files rendered.
    pub files_assembled: usize,

    /// Total number of pages appended.
    pub total_pages: usize,

    /// Page breaks inserted between files.
    pub page_breaks: usize,

    /// Total size of the input files.
    pub input_size: u64,

    /// Time spent reading, rendering and appending.
    pub assembly_time: Duration,

    /// Page span of each file, in input order.
    pub sections: Vec<PageSpan>,
}

impl AssemblyStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }
}

/// Renders validated files into a sink in input order.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    storage: Arc<dyn Storage>,
}

impl DocumentAssembler {
    /// Create an assembler reading inputs from `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Read one file and render it into pages.
    ///
    /// Decoding and layout run on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::FailedToReadInput`] if the file can no longer
    /// be read and [`ConvertError::MalformedContent`] if it cannot be
    /// rendered.
    pub async fn render_file(&self, file: &InputFile) -> Result<Vec<PageContent>> {
        let bytes = self.storage.read(file.path()).await.map_err(|e| {
            ConvertError::FailedToReadInput {
                name: file.original_name().to_string(),
                path: file.path().to_path_buf(),
                source: e,
            }
        })?;

        let name = file.original_name().to_string();
        let mode = file.render_mode();
        tokio::task::spawn_blocking(move || match mode {
            RenderMode::Text => render_text(&bytes, &name),
            RenderMode::Image => render_image(&bytes, &name).map(|page| vec![page]),
        })
        .await
        .map_err(|e| ConvertError::other(format!("Render task failed: {e}")))?
    }

    /// Render every file and append its pages to `sink`.
    ///
    /// The first file starts on the document's first page; every later file
    /// starts on a fresh page. Text that overflows a page continues on
    /// pages of its own, which are counted in that file's section.
    ///
    /// # Errors
    ///
    /// Returns the first read, render or write error. Pages already appended
    /// stay in the sink; discarding the artifact is the caller's job.
    #[tracing::instrument(skip_all, fields(job_id = %sink.id(), files = files.len()))]
    pub async fn assemble(
        &self,
        files: &[InputFile],
        sink: &mut PdfSink,
    ) -> Result<AssemblyStatistics> {
        let start = Instant::now();
        let mut sections = Vec::with_capacity(files.len());
        let mut page_breaks = 0;

        for (index, file) in files.iter().enumerate() {
            if index > 0 {
                page_breaks += 1;
            }

            let pages = self.render_file(file).await?;
            let span = sink
                .append_file(index, file.original_name(), pages)
                .await?;

            tracing::debug!(
                index,
                file = file.original_name(),
                mode = %file.render_mode(),
                first_page = span.first_page,
                pages = span.page_count,
                bytes_written = sink.bytes_written(),
                "file rendered"
            );
            sections.push(span);
        }

        Ok(AssemblyStatistics {
            files_assembled: files.len(),
            total_pages: sink.page_count(),
            page_breaks,
            input_size: files.iter().map(InputFile::size_bytes).sum(),
            assembly_time: start.elapsed(),
            sections,
        })
    }
}
