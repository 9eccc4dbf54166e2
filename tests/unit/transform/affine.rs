use super::*;
use crate::foundation::core::Point;

fn close(a: Point, b: Point) -> bool {
    (a - b).hypot() < 1e-9
}

#[test]
fn photo_transform_centers_image() {
    let vp = Viewport::from_container(600.0, 1.0);
    let t = Transform {
        scale: 3.0,
        ..Transform::default()
    };
    let a = photo_affine(Vec2::new(400.0, 200.0), &t, &vp);
    assert!(close(a * Point::new(200.0, 100.0), Point::new(300.0, 300.0)));
    assert!(close(a * Point::new(0.0, 0.0), Point::new(-300.0, 0.0)));
    assert!(close(a * Point::new(400.0, 200.0), Point::new(900.0, 600.0)));
}

#[test]
fn offset_is_relative_to_viewport_size() {
    let t = Transform {
        offset: Vec2::new(0.1, -0.2),
        ..Transform::default()
    };
    let img = Vec2::new(100.0, 100.0);
    let big = Viewport::from_container(600.0, 1.0);
    let small = Viewport::from_container(300.0, 1.0);
    let c_big = photo_affine(img, &t, &big) * Point::new(50.0, 50.0);
    let c_small = photo_affine(img, &t, &small) * Point::new(50.0, 50.0);
    assert!(close(c_big, Point::new(360.0, 180.0)));
    assert!(close(c_small, Point::new(180.0, 90.0)));
}

#[test]
fn scale_is_applied_as_total_factor() {
    let vp = Viewport::from_container(1080.0, 1.0);
    let t = Transform {
        scale: 0.5,
        ..Transform::default()
    };
    let a = photo_affine(Vec2::new(1350.0, 1013.0), &t, &vp);
    let [sx, ..] = a.as_coeffs();
    assert_eq!(sx, 0.5);
    let width = (a * Point::new(1350.0, 0.0) - a * Point::new(0.0, 0.0)).hypot();
    assert!((width - 675.0).abs() < 1e-9);
}

#[test]
fn rotation_turns_about_image_center() {
    let t = Transform {
        rotation_deg: 90.0,
        ..Transform::default()
    };
    let vp = Viewport::from_container(100.0, 1.0);
    let a = photo_affine(Vec2::new(10.0, 10.0), &t, &vp);
    assert!(close(a * Point::new(5.0, 5.0), Point::new(50.0, 50.0)));
    // +x of the image maps to +y on screen (clockwise in y-down space).
    assert!(close(a * Point::new(10.0, 5.0), Point::new(50.0, 55.0)));
}

#[test]
fn frame_fills_viewport_width() {
    let vp = Viewport::from_container(300.0, 1350.0 / 1080.0);
    let a = frame_affine(Vec2::new(1080.0, 1350.0), &vp);
    assert!(close(a * Point::new(0.0, 0.0), Point::new(0.0, 0.0)));
    assert!(close(a * Point::new(1080.0, 1350.0), Point::new(300.0, 375.0)));
    assert_eq!(frame_scale(Vec2::ZERO, &vp), 0.0);
}

#[test]
fn resolution_scales_uniformly() {
    let vp = Viewport::from_container(100.0, 1.0);
    let live = frame_affine(Vec2::new(50.0, 50.0), &vp);
    let export = resolution(3) * live;
    assert!(close(export * Point::new(50.0, 50.0), Point::new(300.0, 300.0)));
}
