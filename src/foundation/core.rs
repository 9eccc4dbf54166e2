use std::sync::Arc;

use crate::foundation::error::{TwibbonError, TwibbonResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Immutable premultiplied RGBA8 pixel buffer.
///
/// Cloning shares the backing allocation. The pixels are released when the last clone drops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    rgba8_premul: Arc<[u8]>,
}

impl PixelBuffer {
    /// Wrap row-major premultiplied RGBA8 bytes.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> TwibbonResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(|| TwibbonError::validation("pixel buffer dimensions overflow"))?;
        if rgba8_premul.len() != expected {
            return Err(TwibbonError::validation(format!(
                "pixel buffer byte length {} does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: rgba8_premul.into(),
        })
    }

    /// Single-color buffer, mostly useful for fixtures and placeholders.
    pub fn solid(width: u32, height: u32, color: Rgba8Premul) -> Self {
        let px = [color.r, color.g, color.b, color.a];
        let bytes = px.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            rgba8_premul: bytes.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(f64::from(self.width), f64::from(self.height))
    }

    pub fn center(&self) -> Point {
        Point::new(f64::from(self.width) * 0.5, f64::from(self.height) * 0.5)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba8_premul
    }

    /// Pixel at `(x, y)`, premultiplied.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.rgba8_premul[i..i + 4];
        Some(Rgba8Premul {
            r: p[0],
            g: p[1],
            b: p[2],
            a: p[3],
        })
    }

    /// True when no other handle shares this allocation.
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.rgba8_premul) == 1
    }

    /// Weak handle for observing when the pixels are released.
    pub fn downgrade(&self) -> std::sync::Weak<[u8]> {
        Arc::downgrade(&self.rgba8_premul)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        use crate::foundation::math::mul_div255_u8;

        Self {
            r: mul_div255_u8(u16::from(r), u16::from(a)),
            g: mul_div255_u8(u16::from(g), u16::from(a)),
            b: mul_div255_u8(u16::from(b), u16::from(a)),
            a,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
