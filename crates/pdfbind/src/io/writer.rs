//! Incremental PDF writing.
//!
//! A [`PdfSink`] writes each page's objects to storage as soon as the page
//! is appended, tracking byte offsets as it goes. The objects every page
//! refers to (page tree, catalog, font and info dictionary) use reserved
//! ids and are written by [`PdfSink::finish`] together with the
//! cross-reference table and trailer.
//!
//! Reserved object ids:
//!
//! | id | object           |
//! |----|------------------|
//! | 1  | page tree        |
//! | 2  | catalog          |
//! | 3  | Helvetica font   |
//! | 4  | info dictionary  |
//!
//! # Examples
//!
//! ```no_run
//! use pdfbind::config::{CompressionLevel, DocumentMetadata};
//! use pdfbind::io::OutputWriter;
//! use pdfbind::job::JobId;
//! use pdfbind::render::render_text;
//! use pdfbind::storage::FsStorage;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let writer = OutputWriter::new(
//!     Arc::new(FsStorage::new("output")),
//!     CompressionLevel::Standard,
//!     DocumentMetadata::default(),
//! );
//! let mut sink = writer.open(JobId::new()).await?;
//! sink.append_file(0, "notes.txt", render_text(b"hello", "notes.txt")?).await?;
//! let document = sink.finish().await?;
//! println!("Wrote {} page(s) to {}", document.page_count, document.path.display());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::config::{CompressionLevel, DocumentMetadata};
use crate::error::{ConvertError, Result};
use crate::job::JobId;
use crate::render::{FONT_RESOURCE, IMAGE_RESOURCE, PAGE_HEIGHT, PAGE_WIDTH, PageContent};
use crate::storage::Storage;
use crate::utils::format_file_size;

const PDF_HEADER: &[u8] = b"%PDF-1.5\n%\xE2\xE3\xCF\xD3\n";

const PAGES_ID: ObjectId = (1, 0);
const CATALOG_ID: ObjectId = (2, 0);
const FONT_ID: ObjectId = (3, 0);
const INFO_ID: ObjectId = (4, 0);
const FIRST_FREE_ID: u32 = 5;

const BUFFER_SIZE: usize = 64 * 1024;

/// Pages produced for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpan {
    /// Index of the input file in the job.
    pub file_index: usize,
    /// Original name of the input file.
    pub original_name: String,
    /// First page of the span (1-based).
    pub first_page: usize,
    /// Number of pages in the span.
    pub page_count: usize,
}

/// A completed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDocument {
    /// Identifier of the job that produced the document.
    pub id: JobId,
    /// File name of the artifact (`<uuid>.pdf`).
    pub file_name: String,
    /// Full path of the artifact.
    pub path: PathBuf,
    /// Total number of pages.
    pub page_count: usize,
    /// Size of the artifact in bytes.
    pub size_bytes: u64,
    /// Pages produced for each input file, in input order.
    pub sections: Vec<PageSpan>,
}

impl OutputDocument {
    /// Format the artifact size as a human-readable string.
    pub fn format_size(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

/// Factory for per-job PDF sinks.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    storage: Arc<dyn Storage>,
    compression: CompressionLevel,
    metadata: DocumentMetadata,
}

impl OutputWriter {
    /// Create a writer storing artifacts through `storage`.
    pub fn new(
        storage: Arc<dyn Storage>,
        compression: CompressionLevel,
        metadata: DocumentMetadata,
    ) -> Self {
        Self {
            storage,
            compression,
            metadata,
        }
    }

    /// Create the artifact for job `id` and return a sink writing into it.
    ///
    /// The creation timestamp recorded in the document is taken here.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::FailedToCreateOutput`] if the artifact cannot
    /// be created. No artifact exists in that case.
    pub async fn open(&self, id: JobId) -> Result<PdfSink> {
        let file_name = id.artifact_name();
        let sink = self
            .storage
            .open_write_sink(&file_name)
            .await
            .map_err(|e| ConvertError::FailedToCreateOutput {
                path: PathBuf::from(&file_name),
                source: e,
            })?;

        tracing::debug!(job_id = %id, path = %sink.path.display(), "output opened");

        Ok(PdfSink {
            id,
            file_name,
            path: sink.path,
            writer: BufWriter::with_capacity(BUFFER_SIZE, sink.writer),
            offset: 0,
            offsets: Vec::new(),
            next_id: FIRST_FREE_ID,
            page_ids: Vec::new(),
            sections: Vec::new(),
            compression: self.compression,
            metadata: self.metadata.clone(),
            created_at: Utc::now(),
            failed: false,
        })
    }
}

/// Append-only sink for the pages of one document.
///
/// Once a write fails the sink refuses all further writes.
pub struct PdfSink {
    id: JobId,
    file_name: String,
    path: PathBuf,
    writer: BufWriter<Box<dyn AsyncWrite + Send + Unpin>>,
    offset: u64,
    /// `(object number, byte offset)` in write order.
    offsets: Vec<(u32, u64)>,
    next_id: u32,
    page_ids: Vec<ObjectId>,
    sections: Vec<PageSpan>,
    compression: CompressionLevel,
    metadata: DocumentMetadata,
    created_at: DateTime<Utc>,
    failed: bool,
}

impl std::fmt::Debug for PdfSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfSink")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("offset", &self.offset)
            .field("pages", &self.page_ids.len())
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl PdfSink {
    /// Job identifier.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Path of the artifact being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Bytes handed to the writer so far.
    pub fn bytes_written(&self) -> u64 {
        self.offset
    }

    /// Append the pages produced for one input file.
    ///
    /// # Errors
    ///
    /// Returns an error if `pages` is empty, if stream encoding fails, or
    /// if writing fails.
    pub async fn append_file(
        &mut self,
        file_index: usize,
        original_name: &str,
        pages: Vec<PageContent>,
    ) -> Result<PageSpan> {
        if pages.is_empty() {
            return Err(ConvertError::other(format!(
                "No pages rendered for {original_name}"
            )));
        }

        let first_page = self.page_count() + 1;
        let page_count = pages.len();
        for page in pages {
            self.append_page(page, original_name).await?;
        }

        let span = PageSpan {
            file_index,
            original_name: original_name.to_string(),
            first_page,
            page_count,
        };
        self.sections.push(span.clone());
        Ok(span)
    }

    /// Append one page and write its objects immediately.
    ///
    /// Stream compression runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::MalformedContent`] if a stream cannot be
    /// encoded and [`ConvertError::FailedToWrite`] if writing fails.
    pub async fn append_page(&mut self, page: PageContent, original_name: &str) -> Result<ObjectId> {
        self.ensure_writable()?;

        let content_id = self.new_object_id();
        let (image_id, smask_id) = match &page.image {
            Some(image) => {
                let image_id = self.new_object_id();
                let smask_id = image.alpha.is_some().then(|| self.new_object_id());
                (Some(image_id), smask_id)
            }
            None => (None, None),
        };
        let page_id = self.new_object_id();

        let level = self.compression.flate_level();
        let name = original_name.to_string();
        let encoded = tokio::task::spawn_blocking(move || {
            encode_page(page, level, content_id, image_id, smask_id, page_id)
        })
        .await
        .map_err(|e| ConvertError::other(format!("Page encoding task failed: {e}")))?
        .map_err(|e| ConvertError::malformed_content(name, e.to_string()))?;

        for (id, bytes) in encoded {
            self.write_object_bytes(id, &bytes).await?;
        }
        self.page_ids.push(page_id);

        tracing::trace!(page = self.page_ids.len(), bytes = self.offset, "page written");
        Ok(page_id)
    }

    /// Write the document trailer, flush and close the artifact.
    ///
    /// Consumes the sink, so completion or failure is reported exactly
    /// once.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::FailedToWrite`] if any write, the flush or the
    /// shutdown fails.
    pub async fn finish(mut self) -> Result<OutputDocument> {
        self.ensure_writable()?;

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<Object>>(),
            "Count" => self.page_ids.len() as i64,
        };
        let catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => PAGES_ID,
            "Lang" => Object::string_literal(self.metadata.language.as_str()),
            "ViewerPreferences" => dictionary! { "DisplayDocTitle" => true },
        };
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        };
        let producer = format!("{} {}", crate::NAME, crate::VERSION);
        let info = dictionary! {
            "Title" => text_string(&self.metadata.title),
            "Author" => text_string(&self.metadata.author),
            "Creator" => Object::string_literal(crate::NAME),
            "Producer" => Object::string_literal(producer),
            "CreationDate" => Object::string_literal(pdf_date(&self.created_at)),
        };

        for (id, dict) in [
            (PAGES_ID, pages),
            (CATALOG_ID, catalog),
            (FONT_ID, font),
            (INFO_ID, info),
        ] {
            let bytes = encode::indirect_object(id, &Object::Dictionary(dict));
            self.write_object_bytes(id, &bytes).await?;
        }

        let xref_offset = self.offset;
        let xref = self.xref_table();
        self.write_raw(&xref).await?;

        let id_bytes = self.id.as_uuid().as_bytes().to_vec();
        let trailer = dictionary! {
            "Size" => i64::from(self.next_id),
            "Root" => CATALOG_ID,
            "Info" => INFO_ID,
            "ID" => vec![
                Object::String(id_bytes.clone(), StringFormat::Hexadecimal),
                Object::String(id_bytes, StringFormat::Hexadecimal),
            ],
        };
        let mut tail = b"trailer\n".to_vec();
        encode::write_dictionary(&mut tail, &trailer);
        tail.extend_from_slice(format!("\nstartxref\n{xref_offset}\n%%EOF\n").as_bytes());
        self.write_raw(&tail).await?;

        let path = self.path.clone();
        self.writer
            .flush()
            .await
            .map_err(|e| ConvertError::FailedToWrite {
                path: path.clone(),
                source: e,
            })?;
        self.writer
            .shutdown()
            .await
            .map_err(|e| ConvertError::FailedToWrite {
                path: path.clone(),
                source: e,
            })?;

        Ok(OutputDocument {
            id: self.id,
            file_name: self.file_name,
            path,
            page_count: self.page_ids.len(),
            size_bytes: self.offset,
            sections: self.sections,
        })
    }

    fn new_object_id(&mut self) -> ObjectId {
        let id = (self.next_id, 0);
        self.next_id += 1;
        id
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.failed {
            return Err(ConvertError::FailedToWrite {
                path: self.path.clone(),
                source: std::io::Error::other("output stream already failed"),
            });
        }
        Ok(())
    }

    async fn write_object_bytes(&mut self, id: ObjectId, bytes: &[u8]) -> Result<()> {
        if self.offset == 0 {
            self.write_raw(PDF_HEADER).await?;
        }
        self.offsets.push((id.0, self.offset));
        self.write_raw(bytes).await
    }

    async fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        if let Err(e) = self.writer.write_all(bytes).await {
            self.failed = true;
            tracing::debug!(path = %self.path.display(), error = %e, "write failed");
            return Err(ConvertError::FailedToWrite {
                path: self.path.clone(),
                source: e,
            });
        }
        self.offset += bytes.len() as u64;
        Ok(())
    }

    /// Cross-reference table covering ids `0..next_id`.
    fn xref_table(&self) -> Vec<u8> {
        let mut by_id = vec![None; self.next_id as usize];
        for &(id, offset) in &self.offsets {
            if let Some(slot) = by_id.get_mut(id as usize) {
                *slot = Some(offset);
            }
        }

        let mut out = format!("xref\n0 {}\n", self.next_id).into_bytes();
        for (id, offset) in by_id.iter().enumerate() {
            let line = match offset {
                Some(offset) => format!("{offset:010} 00000 n \n"),
                None if id == 0 => "0000000000 65535 f \n".to_string(),
                None => "0000000000 00000 f \n".to_string(),
            };
            out.extend_from_slice(line.as_bytes());
        }
        out
    }
}

/// Encode the objects of one page, in write order.
fn encode_page(
    page: PageContent,
    level: Option<flate2::Compression>,
    content_id: ObjectId,
    image_id: Option<ObjectId>,
    smask_id: Option<ObjectId>,
    page_id: ObjectId,
) -> std::io::Result<Vec<(ObjectId, Vec<u8>)>> {
    let mut objects = Vec::with_capacity(4);

    let content = encode::stream(Dictionary::new(), page.content, level)?;
    objects.push((content_id, encode::indirect_object(content_id, &content)));

    let mut resources = dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => FONT_ID },
    };

    if let (Some(image), Some(image_id)) = (page.image, image_id) {
        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };

        if let (Some(alpha), Some(smask_id)) = (image.alpha, smask_id) {
            let smask_dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(image.width),
                "Height" => i64::from(image.height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            };
            let smask = encode::stream(smask_dict, alpha, level)?;
            objects.push((smask_id, encode::indirect_object(smask_id, &smask)));
            image_dict.set("SMask", smask_id);
        }

        let xobject = encode::stream(image_dict, image.rgb, level)?;
        objects.push((image_id, encode::indirect_object(image_id, &xobject)));
        resources.set("XObject", dictionary! { IMAGE_RESOURCE => image_id });
    }

    let page_dict = dictionary! {
        "Type" => "Page",
        "Parent" => PAGES_ID,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        "Contents" => content_id,
        "Resources" => resources,
    };
    objects.push((page_id, encode::indirect_object(page_id, &Object::Dictionary(page_dict))));

    Ok(objects)
}

/// A text string object: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn pdf_date(at: &DateTime<Utc>) -> String {
    at.format("D:%Y%m%d%H%M%SZ").to_string()
}

mod encode {
    use super::*;

    pub fn stream(
        mut dict: Dictionary,
        data: Vec<u8>,
        level: Option<flate2::Compression>,
    ) -> std::io::Result<Object> {
        let data = match level {
            Some(level) => {
                let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), level);
                encoder.write_all(&data)?;
                dict.set("Filter", "FlateDecode");
                encoder.finish()?
            }
            None => data,
        };
        Ok(Object::Stream(Stream::new(dict, data)))
    }

    pub fn indirect_object(id: ObjectId, object: &Object) -> Vec<u8> {
        let mut out = format!("{} {} obj\n", id.0, id.1).into_bytes();
        write_object(&mut out, object);
        out.extend_from_slice(b"\nendobj\n");
        out
    }

    pub fn write_object(out: &mut Vec<u8>, object: &Object) {
        match object {
            Object::Null => out.extend_from_slice(b"null"),
            Object::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
            Object::Real(r) => out.extend_from_slice(format_real(f64::from(*r)).as_bytes()),
            Object::Name(n) => {
                out.push(b'/');
                out.extend_from_slice(n);
            }
            Object::String(s, StringFormat::Literal) => {
                out.push(b'(');
                for &byte in s {
                    if matches!(byte, b'(' | b')' | b'\\') {
                        out.push(b'\\');
                    }
                    out.push(byte);
                }
                out.push(b')');
            }
            Object::String(s, StringFormat::Hexadecimal) => {
                out.push(b'<');
                for byte in s {
                    out.extend_from_slice(format!("{byte:02X}").as_bytes());
                }
                out.push(b'>');
            }
            Object::Array(arr) => {
                out.push(b'[');
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    write_object(out, obj);
                }
                out.push(b']');
            }
            Object::Dictionary(dict) => write_dictionary(out, dict),
            Object::Stream(stream) => {
                let mut dict = stream.dict.clone();
                dict.set("Length", stream.content.len() as i64);
                write_dictionary(out, &dict);
                out.extend_from_slice(b"\nstream\n");
                out.extend_from_slice(&stream.content);
                out.extend_from_slice(b"\nendstream");
            }
            Object::Reference(id) => {
                out.extend_from_slice(format!("{} {} R", id.0, id.1).as_bytes());
            }
        }
    }

    pub fn write_dictionary(out: &mut Vec<u8>, dict: &Dictionary) {
        out.extend_from_slice(b"<<");
        for (key, value) in dict.iter() {
            out.push(b'/');
            out.extend_from_slice(key);
            out.push(b' ');
            write_object(out, value);
            out.push(b' ');
        }
        out.extend_from_slice(b">>");
    }

    fn format_real(value: f64) -> String {
        let formatted = format!("{value:.3}");
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_image, render_text};
    use crate::storage::MemoryStorage;
    use ::image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn writer_for(storage: &MemoryStorage, compression: CompressionLevel) -> OutputWriter {
        OutputWriter::new(
            Arc::new(storage.clone()),
            compression,
            DocumentMetadata::default(),
        )
    }

    fn load(storage: &MemoryStorage, path: &Path) -> lopdf::Document {
        let bytes = storage.contents(path).unwrap();
        lopdf::Document::load_mem(&bytes).unwrap()
    }

    fn string_value(dict: &Dictionary, key: &[u8]) -> Vec<u8> {
        match dict.get(key).unwrap() {
            Object::String(bytes, _) => bytes.clone(),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_finished_document_parses() {
        let storage = MemoryStorage::new("/out");
        let writer = writer_for(&storage, CompressionLevel::None);
        let mut sink = writer.open(JobId::new()).await.unwrap();

        sink.append_file(0, "a.txt", render_text(b"hello", "a.txt").unwrap())
            .await
            .unwrap();
        sink.append_file(1, "b.txt", render_text(b"world", "b.txt").unwrap())
            .await
            .unwrap();
        let document = sink.finish().await.unwrap();

        assert_eq!(document.page_count, 2);
        assert_eq!(document.sections.len(), 2);
        assert_eq!(document.sections[1].first_page, 2);
        assert!(document.file_name.ends_with(".pdf"));

        let bytes = storage.contents(&document.path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert_eq!(bytes.len() as u64, document.size_bytes);

        let pdf = load(&storage, &document.path);
        let pages = pdf.get_pages();
        assert_eq!(pages.len(), 2);

        let first = pdf.get_page_content(pages[&1]).unwrap();
        assert!(String::from_utf8_lossy(&first).contains("(hello) Tj"));
        let second = pdf.get_page_content(pages[&2]).unwrap();
        assert!(String::from_utf8_lossy(&second).contains("(world) Tj"));
    }

    #[tokio::test]
    async fn test_metadata_and_catalog() {
        let storage = MemoryStorage::new("/out");
        let writer = writer_for(&storage, CompressionLevel::Standard);
        let mut sink = writer.open(JobId::new()).await.unwrap();
        sink.append_file(0, "a.txt", render_text(b"x", "a.txt").unwrap())
            .await
            .unwrap();
        let document = sink.finish().await.unwrap();

        let pdf = load(&storage, &document.path);
        let info_id = pdf.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = pdf.get_dictionary(info_id).unwrap();
        assert_eq!(string_value(info, b"Title"), b"Combined Documents");
        assert_eq!(string_value(info, b"Author"), b"PDF Converter Service");
        assert_eq!(string_value(info, b"Creator"), b"pdfbind");
        assert!(string_value(info, b"CreationDate").starts_with(b"D:"));

        let catalog = pdf.catalog().unwrap();
        assert_eq!(string_value(catalog, b"Lang"), b"en-US");
    }

    #[tokio::test]
    async fn test_xref_entries_are_twenty_bytes() {
        let storage = MemoryStorage::new("/out");
        let writer = writer_for(&storage, CompressionLevel::None);
        let mut sink = writer.open(JobId::new()).await.unwrap();
        sink.append_file(0, "a.txt", render_text(b"x", "a.txt").unwrap())
            .await
            .unwrap();
        let document = sink.finish().await.unwrap();

        let bytes = storage.contents(&document.path).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        let xref = text.split("xref\n").nth(1).unwrap();
        let mut lines = xref.split_inclusive('\n');
        assert_eq!(lines.next().unwrap(), "0 7\n");
        for line in lines.take(7) {
            assert_eq!(line.len(), 20, "bad xref line {line:?}");
        }
    }

    #[tokio::test]
    async fn test_image_with_alpha_gets_soft_mask() {
        let img = RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 100]));
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png).unwrap();

        let storage = MemoryStorage::new("/out");
        let writer = writer_for(&storage, CompressionLevel::Maximum);
        let mut sink = writer.open(JobId::new()).await.unwrap();
        let page = render_image(png.get_ref(), "t.png").unwrap();
        sink.append_file(0, "t.png", vec![page]).await.unwrap();
        let document = sink.finish().await.unwrap();

        let pdf = load(&storage, &document.path);
        let (_, page_id) = pdf.get_pages().into_iter().next().unwrap();
        let page = pdf.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let image_id = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
        let image = pdf.get_object(image_id).unwrap().as_stream().unwrap();

        assert!(image.dict.get(b"SMask").is_ok());
        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_create_failure_leaves_nothing() {
        let storage = MemoryStorage::new("/out");
        storage.fail_create();
        let writer = writer_for(&storage, CompressionLevel::None);

        let err = writer.open(JobId::new()).await.unwrap_err();
        assert!(matches!(err, ConvertError::FailedToCreateOutput { .. }));
        assert!(storage.artifacts().is_empty());
    }

    #[tokio::test]
    async fn test_sink_refuses_writes_after_failure() {
        let storage = MemoryStorage::new("/out");
        storage.fail_writes_after(32);
        let writer = writer_for(&storage, CompressionLevel::None);
        let mut sink = writer.open(JobId::new()).await.unwrap();

        // Large enough to overflow the write buffer.
        let text = "word ".repeat(30_000);
        let pages = render_text(text.as_bytes(), "big.txt").unwrap();
        let err = sink.append_file(0, "big.txt", pages).await.unwrap_err();
        assert!(matches!(err, ConvertError::FailedToWrite { .. }));

        let again = sink
            .append_file(1, "b.txt", render_text(b"x", "b.txt").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(again, ConvertError::FailedToWrite { .. }));
        assert!(sink.finish().await.is_err());
    }

    #[tokio::test]
    async fn test_closed_destination_fails_on_finish() {
        let storage = MemoryStorage::new("/out");
        storage.close_sinks();
        let writer = writer_for(&storage, CompressionLevel::None);
        let mut sink = writer.open(JobId::new()).await.unwrap();

        // Small writes stay buffered; the failure surfaces when flushing.
        sink.append_file(0, "a.txt", render_text(b"x", "a.txt").unwrap())
            .await
            .unwrap();
        let err = sink.finish().await.unwrap_err();
        assert!(matches!(err, ConvertError::FailedToWrite { .. }));
    }

    #[test]
    fn test_text_string_encoding() {
        assert!(matches!(
            text_string("Plain"),
            Object::String(ref bytes, StringFormat::Literal) if bytes == b"Plain"
        ));
        match text_string("Caf\u{e9}") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
                assert_eq!(bytes.len(), 2 + 4 * 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_real_formatting() {
        let mut out = Vec::new();
        encode::write_object(&mut out, &Object::Real(612.0));
        encode::write_object(&mut out, &Object::Real(0.5));
        assert_eq!(out, b"6120.5");
    }
}
