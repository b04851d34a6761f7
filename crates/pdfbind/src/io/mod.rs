//! PDF output operations.
//!
//! This module provides:
//! - [`OutputWriter`]: Opens a uniquely named artifact in storage
//! - [`PdfSink`]: Append-only page sink that streams objects as they arrive
//! - [`OutputDocument`]: Description of a finished artifact

pub mod writer;

pub use writer::{OutputDocument, OutputWriter, PageSpan, PdfSink};
