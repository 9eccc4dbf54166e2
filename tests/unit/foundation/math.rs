use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn premultiply_zeroes_transparent_color() {
    let mut px = vec![10u8, 20, 30, 0, 255, 128, 0, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0, 255, 128, 0, 255]);
}

#[test]
fn unpremultiply_inverts_within_one_step() {
    let straight = [100u8, 50, 200, 128];
    let mut px = straight.to_vec();
    premultiply_rgba8_in_place(&mut px);
    unpremultiply_rgba8_in_place(&mut px);
    for (a, b) in px.iter().zip(straight.iter()) {
        assert!((i16::from(*a) - i16::from(*b)).abs() <= 1, "{a} vs {b}");
    }
    assert_eq!(px[3], 128);
}

#[test]
fn approx_eq_rel_has_absolute_floor() {
    assert!(approx_eq_rel(1.0, 1.0005, 1e-3));
    assert!(!approx_eq_rel(1.0, 1.01, 1e-3));
    assert!(approx_eq_rel(0.0, 0.0005, 1e-3));
    assert!(approx_eq_rel(1000.0, 1000.5, 1e-3));
}
