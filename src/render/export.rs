use std::io::Cursor;

use anyhow::Context;
use image::{ExtendedColorType, ImageFormat};

use crate::foundation::error::{TwibbonError, TwibbonResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;
use crate::render::cpu::CpuCompositor;
use crate::render::snapshot::{CompositionSnapshot, Raster};

/// Encoded output format for [`export`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    /// Lossless WebP; `quality` is ignored.
    #[serde(rename = "webp")]
    WebP,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::WebP => ImageFormat::WebP,
        }
    }

    /// Parse a user-facing name (`png`, `jpg`/`jpeg`, `webp`).
    pub fn parse(s: &str) -> TwibbonResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::WebP),
            other => Err(TwibbonError::input(format!(
                "unknown export format '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    /// Output resolution relative to the on-screen viewport.
    pub multiplier: u32,
    pub format: ExportFormat,
    /// Lossy quality in 1..=100.
    pub quality: u8,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            multiplier: 2,
            format: ExportFormat::Png,
            quality: 85,
        }
    }
}

impl ExportRequest {
    pub fn validate(&self) -> TwibbonResult<()> {
        if self.multiplier == 0 {
            return Err(TwibbonError::validation("export multiplier must be >= 1"));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(TwibbonError::validation(format!(
                "export quality must be in 1..=100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Encoded export and its metadata.
#[derive(Clone, Debug)]
pub struct ExportOutput {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

/// Download name for a campaign slug.
pub fn export_filename(slug: &str, format: ExportFormat) -> String {
    let slug = slug.trim();
    let slug = if slug.is_empty() { "campaign" } else { slug };
    format!("{slug}-twibbon.{}", format.extension())
}

/// Render `snapshot` at `request.multiplier` and encode it.
///
/// Replays the live draw sequence scaled by the multiplier; nothing is produced without a photo.
#[tracing::instrument(skip(compositor, snapshot), fields(draws = snapshot.draws.len()))]
pub fn export(
    compositor: &mut CpuCompositor,
    snapshot: &CompositionSnapshot,
    request: &ExportRequest,
    slug: &str,
) -> TwibbonResult<ExportOutput> {
    if !snapshot.has_photo() {
        return Err(TwibbonError::EmptyComposition);
    }
    request.validate()?;

    let raster = compositor.render(snapshot, request.multiplier)?;
    let bytes = encode_raster(raster.clone(), request.format, request.quality)?;
    tracing::debug!(
        width = raster.width,
        height = raster.height,
        out_len = bytes.len(),
        "encoded export"
    );
    Ok(ExportOutput {
        filename: export_filename(slug, request.format),
        width: raster.width,
        height: raster.height,
        format: request.format,
        bytes,
    })
}

/// Serialize a premultiplied raster.
///
/// PNG and WebP keep alpha after un-premultiplying. JPEG is flattened onto white.
pub fn encode_raster(raster: Raster, format: ExportFormat, quality: u8) -> TwibbonResult<Vec<u8>> {
    let Raster {
        width,
        height,
        mut data,
    } = raster;
    let mut out = Vec::new();
    match format {
        ExportFormat::Png | ExportFormat::WebP => {
            unpremultiply_rgba8_in_place(&mut data);
            image::write_buffer_with_format(
                &mut Cursor::new(&mut out),
                &data,
                width,
                height,
                ExtendedColorType::Rgba8,
                format.image_format(),
            )
            .with_context(|| format!("encode {} export", format.extension()))?;
        }
        ExportFormat::Jpeg => {
            let rgb = flatten_on_white(&data);
            image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut Cursor::new(&mut out),
                quality.clamp(1, 100),
            )
            .encode(&rgb, width, height, ExtendedColorType::Rgb8)
            .context("encode jpeg export")?;
        }
    }
    Ok(out)
}

fn flatten_on_white(premul: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(premul.len() / 4 * 3);
    for px in premul.chunks_exact(4) {
        let cover = 255 - px[3];
        rgb.extend(px[..3].iter().map(|&c| c.saturating_add(cover)));
    }
    rgb
}

#[cfg(test)]
#[path = "../../tests/unit/render/export.rs"]
mod tests;
