use super::*;
use crate::foundation::math::approx_eq_rel;

#[test]
fn initialize_derives_height_from_aspect() {
    let m = ViewportManager::initialize(600.0, 1350.0 / 1080.0).unwrap();
    let v = m.viewport();
    assert_eq!(v.width, 600.0);
    assert!(approx_eq_rel(v.height, 750.0, 1e-9));
}

#[test]
fn rejects_degenerate_aspect_ratio() {
    assert!(ViewportManager::initialize(600.0, 0.0).is_err());
    assert!(ViewportManager::initialize(600.0, f64::NAN).is_err());
    assert!(ViewportManager::initialize(600.0, f64::INFINITY).is_err());
}

#[test]
fn aspect_ratio_holds_across_resize_sequences() {
    let frames = [(1080u32, 1080u32), (1080, 1350), (1920, 1080), (7, 3), (1, 4000)];
    let widths = [600.0, 300.0, 1.0, 333.3, 1024.0, 37.5, 1999.0];
    for (fw, fh) in frames {
        let ratio = f64::from(fh) / f64::from(fw);
        let mut m = ViewportManager::initialize(480.0, ratio).unwrap();
        for w in widths {
            m.on_resize(w);
            let v = m.viewport();
            assert!(
                approx_eq_rel(v.height / v.width, ratio, 1e-3),
                "{fw}x{fh} at {w}: {v:?}"
            );
        }
    }
}

#[test]
fn repeated_width_is_unchanged_and_identical() {
    let mut m = ViewportManager::initialize(600.0, 1.0).unwrap();
    assert!(matches!(m.on_resize(300.0), ResizeOutcome::Resized(_)));
    let first = m.viewport();
    assert_eq!(m.on_resize(300.0), ResizeOutcome::Unchanged);
    assert_eq!(m.viewport(), first);
}

#[test]
fn invalid_widths_are_ignored() {
    let mut m = ViewportManager::initialize(600.0, 1.0).unwrap();
    assert_eq!(m.on_resize(f64::NAN), ResizeOutcome::Ignored);
    assert_eq!(m.on_resize(-5.0), ResizeOutcome::Ignored);
    assert_eq!(m.viewport().width, 600.0);
}

#[test]
fn zero_width_yields_empty_viewport() {
    let mut m = ViewportManager::initialize(600.0, 1.5).unwrap();
    let ResizeOutcome::Resized(v) = m.on_resize(0.0) else {
        panic!("expected resize");
    };
    assert!(v.is_empty());
    assert_eq!(v.raster_size(2), (0, 0));
    assert_eq!(v.to_fraction(Vec2::new(1.0, 1.0)), None);
}

#[test]
fn raster_size_rounds_scaled_dimensions() {
    let v = Viewport::from_container(333.0, 1350.0 / 1080.0);
    assert_eq!(v.raster_size(1), (333, 416));
    assert_eq!(v.raster_size(2), (666, 833));
}

#[test]
fn fraction_pixel_conversion() {
    let v = Viewport::from_container(600.0, 0.5);
    let frac = v.to_fraction(Vec2::new(60.0, -30.0)).unwrap();
    assert!(approx_eq_rel(frac.x, 0.1, 1e-12));
    assert!(approx_eq_rel(frac.y, -0.1, 1e-12));
    let px = v.to_pixels(frac);
    assert!(approx_eq_rel(px.x, 60.0, 1e-12));
    assert!(approx_eq_rel(px.y, -30.0, 1e-12));
}
