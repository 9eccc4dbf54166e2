use crate::foundation::core::{Affine, PixelBuffer, Point};
use crate::foundation::error::{TwibbonError, TwibbonResult};
use crate::ingest::placement::{PlacementPolicy, base_scale};
use crate::transform::affine::{frame_affine, frame_scale, photo_affine};
use crate::transform::controller::Transform;
use crate::viewport::manager::Viewport;

/// Which slot a layer occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Photo,
    Frame,
}

impl LayerKind {
    /// Fixed z-order: the frame always renders above the photo.
    pub fn z_index(self) -> i32 {
        match self {
            Self::Photo => 0,
            Self::Frame => 1,
        }
    }
}

/// User photo: decoded pixels and the placement policy that sizes it against the viewport.
#[derive(Clone, Debug)]
pub struct PhotoLayer {
    pixels: PixelBuffer,
    placement: PlacementPolicy,
}

impl PhotoLayer {
    pub fn new(pixels: PixelBuffer, placement: PlacementPolicy) -> Self {
        Self { pixels, placement }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn placement(&self) -> PlacementPolicy {
        self.placement
    }

    /// Placement factor for the viewport; the initial total scale of a new photo.
    pub fn base_scale(&self, viewport: &Viewport) -> f64 {
        base_scale(self.placement, self.pixels.size(), viewport)
    }

    pub fn affine(&self, transform: &Transform, viewport: &Viewport) -> Affine {
        photo_affine(self.pixels.size(), transform, viewport)
    }
}

/// Frame geometry after the most recent rescale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameGeometry {
    /// Uniform scale mapping frame pixels to viewport pixels.
    pub scale: f64,
    /// Displayed width (equals the viewport width).
    pub width: f64,
    /// Displayed height.
    pub height: f64,
    /// On-screen center.
    pub center: Point,
}

/// Decorative frame drawn above the photo.
#[derive(Clone, Debug)]
pub struct FrameLayer {
    pixels: PixelBuffer,
    geometry: FrameGeometry,
}

impl FrameLayer {
    fn new(pixels: PixelBuffer, viewport: &Viewport) -> Self {
        let geometry = frame_geometry(&pixels, viewport);
        Self { pixels, geometry }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn affine(&self, viewport: &Viewport) -> Affine {
        frame_affine(self.pixels.size(), viewport)
    }
}

fn frame_geometry(pixels: &PixelBuffer, viewport: &Viewport) -> FrameGeometry {
    let size = pixels.size();
    let scale = frame_scale(size, viewport);
    FrameGeometry {
        scale,
        width: viewport.width,
        height: viewport.width * (size.y / size.x),
        center: viewport.center(),
    }
}

/// Two-slot composition: at most one photo (back) and one frame (front).
#[derive(Clone, Debug, Default)]
pub struct LayerStack {
    photo: Option<PhotoLayer>,
    frame: Option<FrameLayer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the campaign frame. A stack only ever receives one frame.
    pub fn set_frame(&mut self, pixels: PixelBuffer, viewport: &Viewport) -> TwibbonResult<()> {
        if self.frame.is_some() {
            return Err(TwibbonError::validation("frame layer is already loaded"));
        }
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(TwibbonError::validation("frame image has zero size"));
        }
        self.frame = Some(FrameLayer::new(pixels, viewport));
        Ok(())
    }

    /// Rescale the frame to a new viewport width and re-center it.
    pub fn rescale_frame(&mut self, viewport: &Viewport) -> Option<FrameGeometry> {
        let frame = self.frame.as_mut()?;
        frame.geometry = frame_geometry(&frame.pixels, viewport);
        Some(frame.geometry)
    }

    /// Swap in a fully built photo layer, returning the previous one.
    pub fn replace_photo(&mut self, layer: PhotoLayer) -> Option<PhotoLayer> {
        self.photo.replace(layer)
    }

    pub fn clear_photo(&mut self) -> Option<PhotoLayer> {
        self.photo.take()
    }

    pub fn photo(&self) -> Option<&PhotoLayer> {
        self.photo.as_ref()
    }

    pub fn frame(&self) -> Option<&FrameLayer> {
        self.frame.as_ref()
    }

    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    pub fn len(&self) -> usize {
        usize::from(self.photo.is_some()) + usize::from(self.frame.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Layers in ascending z-order.
    pub fn layers(&self) -> impl Iterator<Item = LayerRef<'_>> {
        let photo = self.photo.as_ref().map(LayerRef::Photo);
        let frame = self.frame.as_ref().map(LayerRef::Frame);
        photo.into_iter().chain(frame)
    }
}

/// Borrowed view of one stack slot.
#[derive(Clone, Copy, Debug)]
pub enum LayerRef<'a> {
    Photo(&'a PhotoLayer),
    Frame(&'a FrameLayer),
}

impl LayerRef<'_> {
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Photo(_) => LayerKind::Photo,
            Self::Frame(_) => LayerKind::Frame,
        }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        match self {
            Self::Photo(p) => p.pixels(),
            Self::Frame(f) => f.pixels(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/stack.rs"]
mod tests;
