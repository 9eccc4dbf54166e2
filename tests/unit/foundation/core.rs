use super::*;

#[test]
fn from_premul_checks_length() {
    assert!(PixelBuffer::from_premul(2, 2, vec![0; 16]).is_ok());
    assert!(PixelBuffer::from_premul(2, 2, vec![0; 15]).is_err());
}

#[test]
fn solid_and_pixel_lookup() {
    let c = Rgba8Premul::from_straight_rgba(200, 100, 0, 128);
    let buf = PixelBuffer::solid(3, 2, c);
    assert_eq!(buf.pixel(2, 1), Some(c));
    assert_eq!(buf.pixel(3, 0), None);
    assert_eq!(buf.center(), Point::new(1.5, 1.0));
}

#[test]
fn clones_share_pixels() {
    let a = PixelBuffer::solid(1, 1, Rgba8Premul::transparent());
    assert!(a.is_unique());
    let b = a.clone();
    assert!(!a.is_unique());
    let weak = a.downgrade();
    drop(a);
    drop(b);
    assert!(weak.upgrade().is_none());
}

#[test]
fn straight_to_premul_rounds() {
    let c = Rgba8Premul::from_straight_rgba(100, 50, 200, 128);
    assert_eq!(
        (c.r, c.g, c.b, c.a),
        (
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128
        )
    );
}
