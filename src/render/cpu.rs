use std::sync::{Arc, Weak};

use crate::foundation::core::{Affine, PixelBuffer, Point, Rgba8Premul};
use crate::foundation::error::{TwibbonError, TwibbonResult};
use crate::layers::stack::LayerKind;
use crate::render::snapshot::{CompositionSnapshot, DrawCall, Raster};
use crate::transform::affine::resolution;

/// Interaction overlays drawn by the live renderer only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decorations {
    /// Outline and corner handles around the photo.
    pub selection: bool,
    /// Straight RGBA color for the overlays.
    pub color: [u8; 4],
    /// Outline thickness in viewport pixels.
    pub outline_px: f64,
    /// Handle edge length in viewport pixels.
    pub handle_px: f64,
}

impl Decorations {
    pub const NONE: Self = Self {
        selection: false,
        color: [0x4f, 0x46, 0xe5, 0xff],
        outline_px: 1.0,
        handle_px: 10.0,
    };

    pub fn selection() -> Self {
        Self {
            selection: true,
            ..Self::NONE
        }
    }

    /// Overlay color as it lands on an opaque region.
    pub fn premul_color(&self) -> Rgba8Premul {
        let [r, g, b, a] = self.color;
        Rgba8Premul::from_straight_rgba(r, g, b, a)
    }
}

impl Default for Decorations {
    fn default() -> Self {
        Self::NONE
    }
}

/// Live render result: the draw list that was replayed and the pixels it produced.
#[derive(Clone, Debug)]
pub struct LiveFrame {
    pub draws: Vec<DrawCall>,
    pub raster: Raster,
}

struct CachedPaint {
    kind: LayerKind,
    source: Weak<[u8]>,
    paint: vello_cpu::Image,
}

/// CPU compositor on top of `vello_cpu`.
///
/// Keeps one converted paint per layer slot so repeated live renders skip pixel conversion.
#[derive(Default)]
pub struct CpuCompositor {
    paints: Vec<CachedPaint>,
}

impl CpuCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of converted paints currently held.
    pub fn cached_paints(&self) -> usize {
        self.paints.len()
    }

    /// Drop converted paints whose source buffer no longer exists. Returns how many were dropped.
    pub fn evict_released(&mut self) -> usize {
        let before = self.paints.len();
        self.paints.retain(|c| c.source.strong_count() > 0);
        before - self.paints.len()
    }

    /// On-screen render at multiplier 1, with optional interaction overlays on top.
    pub fn render_live(
        &mut self,
        snapshot: &CompositionSnapshot,
        decorations: Decorations,
    ) -> TwibbonResult<LiveFrame> {
        let raster = self.rasterize(snapshot, 1, |ctx| {
            if decorations.selection
                && let Some(photo) = snapshot.photo()
            {
                draw_selection(ctx, photo, decorations);
            }
        })?;
        Ok(LiveFrame {
            draws: snapshot.draws.clone(),
            raster,
        })
    }

    /// Off-screen render at `multiplier`, layers only.
    pub fn render(
        &mut self,
        snapshot: &CompositionSnapshot,
        multiplier: u32,
    ) -> TwibbonResult<Raster> {
        self.rasterize(snapshot, multiplier, |_| {})
    }

    fn rasterize(
        &mut self,
        snapshot: &CompositionSnapshot,
        multiplier: u32,
        overlay: impl FnOnce(&mut vello_cpu::RenderContext),
    ) -> TwibbonResult<Raster> {
        if multiplier == 0 {
            return Err(TwibbonError::export("multiplier must be >= 1"));
        }
        if snapshot.viewport.is_empty() {
            return Err(TwibbonError::export("viewport has zero size"));
        }
        let (width, height) = snapshot.viewport.raster_size(multiplier);
        let width_u16: u16 = width
            .try_into()
            .map_err(|_| TwibbonError::export("raster width exceeds u16"))?;
        let height_u16: u16 = height
            .try_into()
            .map_err(|_| TwibbonError::export("raster height exceeds u16"))?;
        if width_u16 == 0 || height_u16 == 0 {
            return Err(TwibbonError::export("raster has zero size"));
        }

        self.evict_released();
        let scale = resolution(multiplier);
        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        for draw in &snapshot.draws {
            let paint = self.paint_for(draw.kind, &draw.pixels)?;
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(affine_to_cpu(scale * draw.transform));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(draw.pixels.width()),
                f64::from(draw.pixels.height()),
            ));
        }
        ctx.set_transform(affine_to_cpu(scale));
        overlay(&mut ctx);
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(Raster {
            width,
            height,
            data: pixmap.data_as_u8_slice().to_vec(),
        })
    }

    fn paint_for(
        &mut self,
        kind: LayerKind,
        pixels: &PixelBuffer,
    ) -> TwibbonResult<vello_cpu::Image> {
        let source = pixels.downgrade();
        if let Some(cached) = self.paints.iter().find(|c| c.kind == kind)
            && Weak::ptr_eq(&cached.source, &source)
            && cached.source.strong_count() > 0
        {
            return Ok(cached.paint.clone());
        }

        let pixmap = pixmap_from_buffer(pixels)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.paints.retain(|c| c.kind != kind);
        self.paints.push(CachedPaint {
            kind,
            source,
            paint: paint.clone(),
        });
        Ok(paint)
    }
}

fn draw_selection(ctx: &mut vello_cpu::RenderContext, photo: &DrawCall, deco: Decorations) {
    let [r, g, b, a] = deco.color;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));

    let corners = photo.corners();
    for i in 0..corners.len() {
        let p0 = corners[i];
        let p1 = corners[(i + 1) % corners.len()];
        if let Some(edge) = edge_quad(p0, p1, deco.outline_px) {
            ctx.fill_path(&edge);
        }
    }
    for c in corners {
        let half = deco.handle_px * 0.5;
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            c.x - half,
            c.y - half,
            c.x + half,
            c.y + half,
        ));
    }
}

fn edge_quad(p0: Point, p1: Point, thickness: f64) -> Option<vello_cpu::kurbo::BezPath> {
    let d = p1 - p0;
    let len = d.hypot();
    if len <= f64::EPSILON {
        return None;
    }
    let n = kurbo::Vec2::new(-d.y, d.x) * (thickness * 0.5 / len);
    let mut path = vello_cpu::kurbo::BezPath::new();
    path.move_to(point_to_cpu(p0 + n));
    path.line_to(point_to_cpu(p1 + n));
    path.line_to(point_to_cpu(p1 - n));
    path.line_to(point_to_cpu(p0 - n));
    path.close_path();
    Some(path)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn pixmap_from_buffer(buf: &PixelBuffer) -> TwibbonResult<vello_cpu::Pixmap> {
    let w: u16 = buf
        .width()
        .try_into()
        .map_err(|_| TwibbonError::export("image width exceeds u16"))?;
    let h: u16 = buf
        .height()
        .try_into()
        .map_err(|_| TwibbonError::export("image height exceeds u16"))?;

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(buf.width() as usize * buf.height() as usize);
    for px in buf.as_bytes().chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
