//! Shared helpers for the pdfbind integration tests.
//!
//! Inputs are staged the way an upload layer would leave them: bytes under
//! a temporary path that carries no extension, plus the original file name.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pdfbind::config::{CompressionLevel, Config};
use pdfbind::job::FileSubmission;

/// Scratch area holding staged uploads and the output directory.
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    /// Config writing into this workspace, with uncompressed streams so page
    /// content can be inspected directly.
    pub fn config(&self) -> Config {
        Config {
            compression: CompressionLevel::None,
            ..Config::with_output_dir(self.output_dir())
        }
    }

    /// Stage `bytes` as an upload named `original_name`.
    pub fn upload(&self, original_name: &str, bytes: impl AsRef<[u8]>) -> FileSubmission {
        let path = self.dir.path().join(format!("upload-{original_name}.part"));
        std::fs::write(&path, bytes).expect("Failed to stage upload");
        FileSubmission::new(path, original_name)
    }

    /// Stage an upload of exactly `size` bytes without materialising them.
    pub fn upload_sized(&self, original_name: &str, size: u64) -> FileSubmission {
        let path = self.dir.path().join(format!("upload-{original_name}.part"));
        let file = std::fs::File::create(&path).expect("Failed to stage upload");
        file.set_len(size).expect("Failed to size upload");
        FileSubmission::new(path, original_name)
    }

    /// PDF files currently present in the output directory.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        list_pdfs(&self.output_dir())
    }
}

pub fn list_pdfs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "pdf"))
        .collect();
    pdfs.sort();
    pdfs
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([40, 120, 200]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode fixture image");
    bytes
}

pub fn load_pdf(path: &Path) -> lopdf::Document {
    lopdf::Document::load(path).expect("Output should be a valid PDF")
}

/// Operands of the first `cm` operator on a page, as floats.
pub fn image_matrix(pdf: &lopdf::Document, page_id: lopdf::ObjectId) -> Vec<f32> {
    let content = pdf.get_page_content(page_id).expect("Page has content");
    let content = lopdf::content::Content::decode(&content).expect("Content decodes");
    content
        .operations
        .iter()
        .find(|op| op.operator == "cm")
        .map(|op| {
            op.operands
                .iter()
                .map(|o| o.as_float().expect("Numeric operand"))
                .collect()
        })
        .expect("Image page has a transform")
}
