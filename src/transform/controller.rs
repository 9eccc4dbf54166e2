use crate::foundation::core::Vec2;
use crate::foundation::error::{TwibbonError, TwibbonResult};
use crate::viewport::manager::Viewport;

/// Rotation bound in degrees; rotation is clamped to `[-MAX_ROTATION_DEG, MAX_ROTATION_DEG]`.
pub const MAX_ROTATION_DEG: f64 = 180.0;

/// User-controlled affine state of the photo layer.
///
/// `scale` is the total factor from photo pixels to viewport pixels. It starts at the placement
/// (cover-fit) factor and is replaced by each clamped scale input. `offset` is a fraction of the
/// viewport size, measured from the viewport center to the photo center.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    pub scale: f64,
    pub rotation_deg: f64,
    pub offset: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation_deg: 0.0,
            offset: Vec2::ZERO,
        }
    }
}

/// Inclusive scale limits applied to every scale update.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
}

impl ScaleBounds {
    pub fn new(min: f64, max: f64) -> TwibbonResult<Self> {
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min > max {
            return Err(TwibbonError::validation(format!(
                "scale bounds must satisfy 0 < min <= max, got [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self { min: 0.5, max: 1.5 }
    }
}

/// How scale slider values are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// The value becomes the scale factor.
    #[default]
    Absolute,
    /// The value multiplies the current scale factor. Compounds per input event.
    Incremental,
}

/// Owns the photo transform and turns raw input into clamped, normalized updates.
#[derive(Clone, Debug, Default)]
pub struct TransformController {
    transform: Transform,
    bounds: ScaleBounds,
    mode: ScaleMode,
}

impl TransformController {
    pub fn new(bounds: ScaleBounds, mode: ScaleMode) -> Self {
        Self {
            transform: Transform::default(),
            bounds,
            mode,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn bounds(&self) -> ScaleBounds {
        self.bounds
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    /// Restore defaults for a newly placed photo. `initial_scale` is its placement factor and is
    /// stored as is; bounds only apply to scale inputs.
    pub fn reset(&mut self, initial_scale: f64) {
        let scale = if initial_scale.is_finite() && initial_scale > 0.0 {
            initial_scale
        } else {
            Transform::default().scale
        };
        self.transform = Transform {
            scale,
            ..Transform::default()
        };
    }

    /// Apply a scale input and return the stored scale.
    pub fn set_scale(&mut self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.transform.scale;
        }
        let target = match self.mode {
            ScaleMode::Absolute => value,
            ScaleMode::Incremental => self.transform.scale * value,
        };
        self.transform.scale = self.bounds.clamp(target);
        self.transform.scale
    }

    /// Apply an absolute rotation in degrees and return the stored rotation.
    pub fn set_rotation(&mut self, degrees: f64) -> f64 {
        if degrees.is_finite() {
            self.transform.rotation_deg = degrees.clamp(-MAX_ROTATION_DEG, MAX_ROTATION_DEG);
        }
        self.transform.rotation_deg
    }

    /// Set the offset as viewport fractions.
    pub fn set_offset(&mut self, fx: f64, fy: f64) -> Vec2 {
        if fx.is_finite() && fy.is_finite() {
            self.transform.offset = Vec2::new(fx, fy);
        }
        self.transform.offset
    }

    /// Move the photo by a pixel delta measured in the given viewport.
    pub fn drag_by(&mut self, delta_px: Vec2, viewport: &Viewport) -> Vec2 {
        if let Some(frac) = viewport.to_fraction(delta_px)
            && frac.is_finite()
        {
            self.transform.offset += frac;
        }
        self.transform.offset
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/controller.rs"]
mod tests;
