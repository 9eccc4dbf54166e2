//! Layer-to-viewport affine composition.
//!
//! Live rendering and export both use these functions; export only prepends a uniform
//! resolution scale.

use crate::foundation::core::{Affine, Vec2};
use crate::transform::controller::Transform;
use crate::viewport::manager::Viewport;

/// Photo matrix:
/// `T(viewport.center + offset * viewport.size) * R(rotation) * S(scale) * T(-image.center)`.
pub fn photo_affine(image_size: Vec2, transform: &Transform, viewport: &Viewport) -> Affine {
    let center = viewport.center().to_vec2() + viewport.to_pixels(transform.offset);
    Affine::translate(center)
        * Affine::rotate(transform.rotation_deg.to_radians())
        * Affine::scale(transform.scale)
        * Affine::translate(-image_size * 0.5)
}

/// Frame matrix: scaled to the viewport width and centered.
pub fn frame_affine(image_size: Vec2, viewport: &Viewport) -> Affine {
    Affine::translate(viewport.center().to_vec2())
        * Affine::scale(frame_scale(image_size, viewport))
        * Affine::translate(-image_size * 0.5)
}

/// Uniform scale that maps the frame's pixel width onto the viewport width.
pub fn frame_scale(image_size: Vec2, viewport: &Viewport) -> f64 {
    if image_size.x <= 0.0 {
        return 0.0;
    }
    viewport.width / image_size.x
}

/// Resolution scale prepended at export time.
#[inline]
pub fn resolution(multiplier: u32) -> Affine {
    Affine::scale(f64::from(multiplier))
}

#[cfg(test)]
#[path = "../../tests/unit/transform/affine.rs"]
mod tests;
