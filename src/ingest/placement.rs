use crate::foundation::core::Vec2;
use crate::viewport::manager::Viewport;

/// How a freshly ingested photo is sized against the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Scale by the larger axis ratio so the photo always covers the viewport.
    #[default]
    Cover,
    /// Scale to the viewport width; tall viewports may show gaps above and below.
    FitWidth,
    /// Scale to the width, then to the height if the result is shorter than the viewport.
    FitWidthThenCover,
}

/// Placement scale for an image of `image_size` pixels in `viewport`.
///
/// Returns `0.0` for empty images or viewports.
pub fn base_scale(policy: PlacementPolicy, image_size: Vec2, viewport: &Viewport) -> f64 {
    if viewport.is_empty() || image_size.x <= 0.0 || image_size.y <= 0.0 {
        return 0.0;
    }
    let sx = viewport.width / image_size.x;
    let sy = viewport.height / image_size.y;
    match policy {
        PlacementPolicy::Cover => sx.max(sy),
        PlacementPolicy::FitWidth => sx,
        PlacementPolicy::FitWidthThenCover => {
            if image_size.y * sx < viewport.height {
                sy
            } else {
                sx
            }
        }
    }
}

/// True when an image placed at `scale` (centered, unrotated) leaves no uncovered viewport area.
pub fn covers(image_size: Vec2, scale: f64, viewport: &Viewport) -> bool {
    const EPS: f64 = 1e-9;
    image_size.x * scale + EPS >= viewport.width && image_size.y * scale + EPS >= viewport.height
}

#[cfg(test)]
#[path = "../../tests/unit/ingest/placement.rs"]
mod tests;
