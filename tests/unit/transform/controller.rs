use super::*;

#[test]
fn absolute_scale_clamps_to_bounds() {
    let mut c = TransformController::new(ScaleBounds::default(), ScaleMode::Absolute);
    assert_eq!(c.set_scale(0.2), 0.5);
    assert_eq!(c.set_scale(1.2), 1.2);
    assert_eq!(c.set_scale(1.2), 1.2);
    assert_eq!(c.set_scale(9.0), 1.5);
}

#[test]
fn incremental_scale_compounds_but_stays_bounded() {
    let mut c = TransformController::new(ScaleBounds::default(), ScaleMode::Incremental);
    assert_eq!(c.set_scale(1.2), 1.2);
    assert!((c.set_scale(1.2) - 1.44).abs() < 1e-12);
    assert_eq!(c.set_scale(1.2), 1.5);
    for _ in 0..20 {
        c.set_scale(0.5);
    }
    assert_eq!(c.transform().scale, 0.5);
}

#[test]
fn rotation_is_absolute_and_clamped() {
    let mut c = TransformController::default();
    assert_eq!(c.set_rotation(45.0), 45.0);
    assert_eq!(c.set_rotation(-30.0), -30.0);
    assert_eq!(c.set_rotation(270.0), 180.0);
    assert_eq!(c.set_rotation(-1000.0), -180.0);
}

#[test]
fn non_finite_inputs_leave_state_unchanged() {
    let mut c = TransformController::default();
    c.set_scale(1.1);
    c.set_rotation(10.0);
    c.set_offset(0.1, 0.2);
    let before = c.transform();
    c.set_scale(f64::NAN);
    c.set_rotation(f64::INFINITY);
    c.set_offset(f64::NAN, 0.0);
    assert_eq!(c.transform(), before);
}

#[test]
fn drag_accumulates_viewport_fractions() {
    let mut c = TransformController::default();
    let vp = Viewport::from_container(600.0, 1.0);
    c.drag_by(Vec2::new(30.0, 0.0), &vp);
    let off = c.drag_by(Vec2::new(30.0, -60.0), &vp);
    assert!((off.x - 0.1).abs() < 1e-12);
    assert!((off.y + 0.1).abs() < 1e-12);

    let before = c.transform();
    c.drag_by(Vec2::new(10.0, 10.0), &Viewport::ZERO);
    assert_eq!(c.transform(), before);
}

#[test]
fn reset_starts_from_placement_scale() {
    let mut c = TransformController::default();
    c.set_scale(1.4);
    c.set_rotation(90.0);
    c.set_offset(0.3, 0.3);
    c.reset(0.27);
    assert_eq!(
        c.transform(),
        Transform {
            scale: 0.27,
            ..Transform::default()
        }
    );
    // Placement is not a scale input: the stored factor may sit outside the bounds.
    assert_eq!(c.set_scale(0.27), 0.5);

    c.reset(f64::NAN);
    assert_eq!(c.transform(), Transform::default());
    c.reset(0.0);
    assert_eq!(c.transform().scale, 1.0);
}

#[test]
fn bounds_validation() {
    assert!(ScaleBounds::new(0.5, 1.5).is_ok());
    assert!(ScaleBounds::new(1.0, 1.0).is_ok());
    assert!(ScaleBounds::new(0.0, 1.5).is_err());
    assert!(ScaleBounds::new(2.0, 1.5).is_err());
    assert!(ScaleBounds::new(f64::NAN, 1.5).is_err());
}
