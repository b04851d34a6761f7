//! Page rendering primitives.
//!
//! Each input file becomes one or more [`PageContent`] values: a content
//! stream plus the image it draws, if any. Rendering is pure computation;
//! the [`PdfSink`](crate::io::PdfSink) turns page content into PDF objects.
//!
//! All pages share one geometry: US Letter with one-inch margins.

pub mod image;
pub mod text;

pub use self::image::{DecodedImage, Placement, fit_to_box, place_image, render_image};
pub use self::text::{TextLayout, render_text};

/// Page width in PDF units (points).
pub const PAGE_WIDTH: f32 = 612.0;

/// Page height in PDF units (points).
pub const PAGE_HEIGHT: f32 = 792.0;

/// Margin on every side of a text page.
pub const MARGIN: f32 = 72.0;

/// Resource name of the shared text font.
pub const FONT_RESOURCE: &str = "F1";

/// Resource name of the image drawn on an image page.
pub const IMAGE_RESOURCE: &str = "Im1";

/// Everything needed to emit one page.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Uncompressed content stream.
    pub content: Vec<u8>,
    /// Image referenced by the content stream as [`IMAGE_RESOURCE`].
    pub image: Option<DecodedImage>,
}

impl PageContent {
    /// A text-only page.
    pub fn text(content: Vec<u8>) -> Self {
        Self {
            content,
            image: None,
        }
    }

    /// A page drawing `image`.
    pub fn image(content: Vec<u8>, image: DecodedImage) -> Self {
        Self {
            content,
            image: Some(image),
        }
    }
}
