use crate::foundation::core::{Affine, PixelBuffer, Point};
use crate::layers::stack::{LayerKind, LayerRef, LayerStack};
use crate::transform::controller::Transform;
use crate::viewport::manager::Viewport;

/// One layer draw: pixels mapped into viewport space by `transform`.
#[derive(Clone, Debug)]
pub struct DrawCall {
    pub kind: LayerKind,
    pub pixels: PixelBuffer,
    pub transform: Affine,
}

impl DrawCall {
    /// Viewport-space corners of the drawn image, clockwise from the top-left.
    pub fn corners(&self) -> [Point; 4] {
        let (w, h) = (
            f64::from(self.pixels.width()),
            f64::from(self.pixels.height()),
        );
        [
            self.transform * Point::new(0.0, 0.0),
            self.transform * Point::new(w, 0.0),
            self.transform * Point::new(w, h),
            self.transform * Point::new(0.0, h),
        ]
    }
}

/// Immutable capture of everything needed to draw the composite.
///
/// Pixel buffers are shared, not copied; later edits to the session never reach a snapshot.
#[derive(Clone, Debug)]
pub struct CompositionSnapshot {
    pub viewport: Viewport,
    /// Draw calls in ascending z-order.
    pub draws: Vec<DrawCall>,
}

impl CompositionSnapshot {
    /// Resolve every layer of `stack` against `viewport` and the photo `transform`.
    pub fn capture(stack: &LayerStack, transform: &Transform, viewport: Viewport) -> Self {
        let draws = stack
            .layers()
            .map(|layer| {
                let affine = match layer {
                    LayerRef::Photo(p) => p.affine(transform, &viewport),
                    LayerRef::Frame(f) => f.affine(&viewport),
                };
                DrawCall {
                    kind: layer.kind(),
                    pixels: layer.pixels().clone(),
                    transform: affine,
                }
            })
            .collect();
        Self { viewport, draws }
    }

    pub fn has_photo(&self) -> bool {
        self.draws.iter().any(|d| d.kind == LayerKind::Photo)
    }

    pub fn photo(&self) -> Option<&DrawCall> {
        self.draws.iter().find(|d| d.kind == LayerKind::Photo)
    }
}

/// Rasterized composite in premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Raster {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[i..i + 4]);
        Some(px)
    }

    /// Largest per-channel difference against another raster of the same size.
    pub fn max_channel_diff(&self, other: &Raster) -> Option<u8> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| a.abs_diff(*b))
                .max()
                .unwrap_or(0),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/snapshot.rs"]
mod tests;
