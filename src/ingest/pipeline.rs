use std::io::Cursor;

use anyhow::Context;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, imageops::FilterType};

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{TwibbonError, TwibbonResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::ingest::placement::{PlacementPolicy, base_scale};
use crate::layers::stack::PhotoLayer;
use crate::viewport::manager::Viewport;

/// Declared upload types accepted by [`accept_upload`].
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/gif",
    "image/bmp",
];

/// Upload that passed the type and size gate. Nothing is decoded yet.
#[derive(Clone, Debug)]
pub struct Upload {
    bytes: Vec<u8>,
    mime: String,
}

impl Upload {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }
}

/// Gate an upload on its declared MIME type and length.
pub fn accept_upload(bytes: Vec<u8>, mime: &str) -> TwibbonResult<Upload> {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !SUPPORTED_MIME_TYPES.contains(&essence.as_str()) {
        return Err(TwibbonError::unsupported_format(mime));
    }
    if bytes.is_empty() {
        return Err(TwibbonError::EmptyFile);
    }
    Ok(Upload {
        bytes,
        mime: essence,
    })
}

/// Limits for the downscale-and-re-encode step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressOpts {
    /// Longest output edge in pixels.
    pub max_dimension_px: u32,
    /// JPEG quality (1..=100) for opaque sources.
    pub quality: u8,
    /// Upper bound on decoder allocations.
    pub max_alloc_bytes: u64,
}

impl Default for CompressOpts {
    fn default() -> Self {
        Self {
            max_dimension_px: 1350,
            quality: 85,
            max_alloc_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Re-encoded, size-bounded image.
#[derive(Clone, Debug)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Dimensions of the upload before downscaling.
    pub source_width: u32,
    pub source_height: u32,
}

/// Aspect-preserving dimensions whose longest edge is at most `max_dimension`.
///
/// Never upscales; each edge is at least one pixel.
pub fn downscaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension || longest == 0 {
        return (width, height);
    }
    let (max, longest) = (u64::from(max_dimension), u64::from(longest));
    let scale = |v: u32| ((u64::from(v) * max + longest / 2) / longest).clamp(1, max) as u32;
    (scale(width), scale(height))
}

/// Decode the upload under allocation limits, downscale it and re-encode.
///
/// Opaque sources become JPEG at `opts.quality`; anything with an alpha channel stays PNG.
#[tracing::instrument(skip(upload), fields(mime = %upload.mime, len = upload.bytes.len()))]
pub fn compress(upload: &Upload, opts: CompressOpts) -> TwibbonResult<Compressed> {
    if opts.max_dimension_px == 0 {
        return Err(TwibbonError::validation("max_dimension_px must be > 0"));
    }
    let img = decode_limited(&upload.bytes, opts.max_alloc_bytes)?;
    let (source_width, source_height) = (img.width(), img.height());
    let (width, height) =
        downscaled_dimensions(source_width, source_height, opts.max_dimension_px);
    let img = if (width, height) == (source_width, source_height) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    };

    let mut bytes = Vec::new();
    let format = if img.color().has_alpha() {
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("encode compressed png")?;
        ImageFormat::Png
    } else {
        let rgb = img.to_rgb8();
        let quality = opts.quality.clamp(1, 100);
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut Cursor::new(&mut bytes), quality)
            .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            .context("encode compressed jpeg")?;
        ImageFormat::Jpeg
    };

    tracing::debug!(
        source_width,
        source_height,
        width,
        height,
        out_len = bytes.len(),
        "compressed upload"
    );
    Ok(Compressed {
        bytes,
        format,
        width,
        height,
        source_width,
        source_height,
    })
}

impl Compressed {
    /// Decode the compressed bytes into a premultiplied buffer.
    pub fn decode(&self) -> TwibbonResult<PixelBuffer> {
        decode_image(&self.bytes)
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> TwibbonResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| TwibbonError::decode(format!("decode image from memory: {e}")))?;
    into_pixel_buffer(dyn_img)
}

/// Full-resolution decode bounded by `max_alloc_bytes`.
///
/// The header is read first so an oversized image fails before any pixel buffer is allocated.
fn decode_limited(bytes: &[u8], max_alloc_bytes: u64) -> TwibbonResult<DynamicImage> {
    let mut reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("sniff image format")?;
    let mut limits = image::Limits::default();
    limits.max_alloc = Some(max_alloc_bytes);
    reader.limits(limits);
    let decoder = reader
        .into_decoder()
        .map_err(|e| TwibbonError::decode(e.to_string()))?;
    let (width, height) = decoder.dimensions();
    let needed = decoder.total_bytes();
    if needed > max_alloc_bytes {
        return Err(TwibbonError::decode(format!(
            "{width}x{height} image needs {needed} bytes to decode, limit is {max_alloc_bytes}"
        )));
    }
    DynamicImage::from_decoder(decoder).map_err(|e| TwibbonError::decode(e.to_string()))
}

fn into_pixel_buffer(img: DynamicImage) -> TwibbonResult<PixelBuffer> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    PixelBuffer::from_premul(width, height, rgba8_premul)
}

/// Fully built photo, ready to swap into a layer stack.
#[derive(Clone, Debug)]
pub struct PreparedPhoto {
    pub layer: PhotoLayer,
    pub source_width: u32,
    pub source_height: u32,
}

impl PreparedPhoto {
    /// Placement scale this photo would receive in `viewport`.
    pub fn place_on_viewport(&self, viewport: &Viewport) -> f64 {
        base_scale(
            self.layer.placement(),
            self.layer.pixels().size(),
            viewport,
        )
    }
}

/// Run compress and decode off-stage. Nothing outside the returned value is touched.
#[tracing::instrument(skip(upload))]
pub fn prepare_photo(
    upload: &Upload,
    opts: CompressOpts,
    placement: PlacementPolicy,
) -> TwibbonResult<PreparedPhoto> {
    let compressed = compress(upload, opts)?;
    let pixels = compressed.decode()?;
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(TwibbonError::decode("decoded image has zero size"));
    }
    Ok(PreparedPhoto {
        layer: PhotoLayer::new(pixels, placement),
        source_width: compressed.source_width,
        source_height: compressed.source_height,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/ingest/pipeline.rs"]
mod tests;
