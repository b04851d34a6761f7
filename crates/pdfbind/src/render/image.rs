//! Image pages: decode, fit into the image box and center on the page.

use lopdf::content::{Content, Operation};

use super::{IMAGE_RESOURCE, PAGE_HEIGHT, PAGE_WIDTH, PageContent};
use crate::error::{ConvertError, Result};

/// Width of the box images are fitted into.
pub const IMAGE_BOX_WIDTH: f32 = 500.0;

/// Height of the box images are fitted into.
pub const IMAGE_BOX_HEIGHT: f32 = 700.0;

/// Decoded 8-bit RGB pixels with an optional 8-bit alpha plane.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGB samples, three bytes per pixel.
    pub rgb: Vec<u8>,
    /// Row-major alpha samples, present only if some pixel is not opaque.
    pub alpha: Option<Vec<u8>>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_alpha", &self.alpha.is_some())
            .finish()
    }
}

impl DecodedImage {
    /// Decode PNG or JPEG bytes.
    ///
    /// # Errors
    ///
    /// Returns the decoder error for unknown formats, corrupt data and
    /// images with a zero dimension.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, ::image::ImageError> {
        let decoded = ::image::load_from_memory(bytes)?;
        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(::image::ImageError::Limits(
                ::image::error::LimitError::from_kind(
                    ::image::error::LimitErrorKind::DimensionError,
                ),
            ));
        }

        if !decoded.color().has_alpha() {
            return Ok(Self {
                width,
                height,
                rgb: decoded.to_rgb8().into_raw(),
                alpha: None,
            });
        }

        let rgba = decoded.to_rgba8().into_raw();
        let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
        let mut alpha = Vec::with_capacity(rgba.len() / 4);
        for pixel in rgba.chunks_exact(4) {
            rgb.extend_from_slice(&pixel[..3]);
            alpha.push(pixel[3]);
        }
        let opaque = alpha.iter().all(|&a| a == u8::MAX);

        Ok(Self {
            width,
            height,
            rgb,
            alpha: (!opaque).then_some(alpha),
        })
    }
}

/// Where an image is drawn on the page, in PDF units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    /// Drawn width.
    pub width: f32,
    /// Drawn height.
    pub height: f32,
}

/// Largest size with the image's aspect ratio that fits in the box.
///
/// Scales up as well as down.
pub fn fit_to_box(width: u32, height: u32, box_width: f32, box_height: f32) -> (f32, f32) {
    let (w, h) = (width as f32, height as f32);
    let scale = (box_width / w).min(box_height / h);
    (w * scale, h * scale)
}

/// Fit an image into the image box and center it on the page.
pub fn place_image(width: u32, height: u32) -> Placement {
    let (w, h) = fit_to_box(width, height, IMAGE_BOX_WIDTH, IMAGE_BOX_HEIGHT);
    Placement {
        x: (PAGE_WIDTH - w) / 2.0,
        y: (PAGE_HEIGHT - h) / 2.0,
        width: w,
        height: h,
    }
}

fn image_content(placement: &Placement) -> lopdf::Result<Vec<u8>> {
    Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    placement.width.into(),
                    0.into(),
                    0.into(),
                    placement.height.into(),
                    placement.x.into(),
                    placement.y.into(),
                ],
            ),
            Operation::new("Do", vec![IMAGE_RESOURCE.into()]),
            Operation::new("Q", vec![]),
        ],
    }
    .encode()
}

/// Decode image bytes and build its page.
///
/// CPU bound; callers on an async runtime should run it on the blocking
/// pool.
///
/// # Errors
///
/// Returns [`ConvertError::MalformedContent`] if the bytes cannot be
/// decoded.
pub fn render_image(bytes: &[u8], name: &str) -> Result<PageContent> {
    let image = DecodedImage::decode(bytes)
        .map_err(|e| ConvertError::malformed_content(name, e.to_string()))?;

    let placement = place_image(image.width, image.height);
    tracing::debug!(
        file = name,
        width = image.width,
        height = image.height,
        drawn_width = placement.width,
        drawn_height = placement.height,
        "image placed on page"
    );

    let content = image_content(&placement)
        .map_err(|e| ConvertError::malformed_content(name, e.to_string()))?;
    Ok(PageContent::image(content, image))
}
