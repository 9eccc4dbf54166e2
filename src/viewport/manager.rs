use crate::foundation::core::{Point, Rect, Vec2};
use crate::foundation::error::{TwibbonError, TwibbonResult};

/// On-screen render surface, locked to the frame's aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Display width in CSS pixels.
    pub width: f64,
    /// Display height in CSS pixels (`width * aspect_ratio`).
    pub height: f64,
}

impl Viewport {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Compute the viewport for a container width and a `height / width` ratio.
    pub fn from_container(container_width: f64, aspect_ratio: f64) -> Self {
        let width = container_width.max(0.0);
        Self {
            width,
            height: width * aspect_ratio,
        }
    }

    /// A zero-size viewport disables uploads and export.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Raster dimensions at an export multiplier.
    pub fn raster_size(&self, multiplier: u32) -> (u32, u32) {
        let m = f64::from(multiplier);
        let w = (self.width * m).round().max(0.0);
        let h = (self.height * m).round().max(0.0);
        (w as u32, h as u32)
    }

    /// Convert an absolute pixel offset into viewport-relative fractions.
    pub fn to_fraction(&self, px: Vec2) -> Option<Vec2> {
        if self.is_empty() {
            return None;
        }
        Some(Vec2::new(px.x / self.width, px.y / self.height))
    }

    /// Convert viewport-relative fractions into absolute pixels.
    pub fn to_pixels(&self, fraction: Vec2) -> Vec2 {
        Vec2::new(fraction.x * self.width, fraction.y * self.height)
    }
}

/// Result of a resize notification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResizeOutcome {
    /// Width matched the current geometry; nothing recomputed.
    Unchanged,
    /// Geometry changed to the contained viewport.
    Resized(Viewport),
    /// Notification carried an unusable width and was dropped.
    Ignored,
}

/// Derives viewport geometry from container width and a fixed aspect ratio.
#[derive(Clone, Debug)]
pub struct ViewportManager {
    aspect_ratio: f64,
    container_width: f64,
    viewport: Viewport,
}

impl ViewportManager {
    /// Build the manager for a `height / width` aspect ratio.
    pub fn initialize(container_width: f64, aspect_ratio: f64) -> TwibbonResult<Self> {
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(TwibbonError::validation(format!(
                "aspect ratio must be finite and > 0, got {aspect_ratio}"
            )));
        }
        let container_width = sanitize_width(container_width).unwrap_or(0.0);
        Ok(Self {
            aspect_ratio,
            container_width,
            viewport: Viewport::from_container(container_width, aspect_ratio),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    /// Recompute geometry for a new container width.
    ///
    /// Repeating the current width is a no-op, so storms of identical notifications cost nothing.
    pub fn on_resize(&mut self, new_container_width: f64) -> ResizeOutcome {
        let Some(width) = sanitize_width(new_container_width) else {
            tracing::debug!(width = new_container_width, "ignoring invalid container width");
            return ResizeOutcome::Ignored;
        };
        if width == self.container_width {
            return ResizeOutcome::Unchanged;
        }
        self.container_width = width;
        self.viewport = Viewport::from_container(width, self.aspect_ratio);
        ResizeOutcome::Resized(self.viewport)
    }
}

fn sanitize_width(width: f64) -> Option<f64> {
    (width.is_finite() && width >= 0.0).then_some(width)
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/manager.rs"]
mod tests;
