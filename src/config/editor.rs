use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{TwibbonError, TwibbonResult};
use crate::ingest::pipeline::CompressOpts;
use crate::ingest::placement::PlacementPolicy;
use crate::render::export::ExportRequest;
use crate::transform::controller::{ScaleBounds, ScaleMode};

/// Editor tunables. Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub scale_mode: ScaleMode,
    pub placement: PlacementPolicy,
    /// Longest edge of an ingested photo after compression.
    pub max_dimension_px: u32,
    /// JPEG quality used when re-encoding opaque uploads.
    pub compress_quality: u8,
    pub decode_max_alloc_bytes: u64,
    /// Defaults for exports that do not pass their own request.
    pub export: ExportRequest,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let compress = CompressOpts::default();
        let bounds = ScaleBounds::default();
        Self {
            min_scale: bounds.min,
            max_scale: bounds.max,
            scale_mode: ScaleMode::default(),
            placement: PlacementPolicy::default(),
            max_dimension_px: compress.max_dimension_px,
            compress_quality: compress.quality,
            decode_max_alloc_bytes: compress.max_alloc_bytes,
            export: ExportRequest::default(),
        }
    }
}

impl EditorConfig {
    /// Read a JSON config file. The result is validated.
    pub fn from_path(path: impl AsRef<Path>) -> TwibbonResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read editor config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| TwibbonError::serde(format!("parse '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `TWIBBON_*` process environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned());

        if let Some(v) = get("TWIBBON_MIN_SCALE").and_then(|v| v.parse().ok()) {
            self.min_scale = v;
        }
        if let Some(v) = get("TWIBBON_MAX_SCALE").and_then(|v| v.parse().ok()) {
            self.max_scale = v;
        }
        if let Some(v) = get("TWIBBON_MAX_DIMENSION").and_then(|v| v.parse().ok()) {
            self.max_dimension_px = v;
        }
        if let Some(v) = get("TWIBBON_COMPRESS_QUALITY").and_then(|v| v.parse().ok()) {
            self.compress_quality = v;
        }
        if let Some(v) = get("TWIBBON_DECODE_MAX_ALLOC").and_then(|v| v.parse().ok()) {
            self.decode_max_alloc_bytes = v;
        }
        if let Some(v) = get("TWIBBON_EXPORT_MULTIPLIER").and_then(|v| v.parse().ok()) {
            self.export.multiplier = v;
        }
        self
    }

    pub fn validate(&self) -> TwibbonResult<()> {
        ScaleBounds::new(self.min_scale, self.max_scale)?;
        if self.max_dimension_px == 0 {
            return Err(TwibbonError::validation("max_dimension_px must be > 0"));
        }
        if !(1..=100).contains(&self.compress_quality) {
            return Err(TwibbonError::validation(format!(
                "compress_quality must be in 1..=100, got {}",
                self.compress_quality
            )));
        }
        self.export.validate()
    }

    pub fn scale_bounds(&self) -> TwibbonResult<ScaleBounds> {
        ScaleBounds::new(self.min_scale, self.max_scale)
    }

    pub fn compress_opts(&self) -> CompressOpts {
        CompressOpts {
            max_dimension_px: self.max_dimension_px,
            quality: self.compress_quality,
            max_alloc_bytes: self.decode_max_alloc_bytes,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/editor.rs"]
mod tests;
