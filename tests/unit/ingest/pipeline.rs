use std::io::Cursor;

use super::*;

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn gradient_rgb(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(image::RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

#[test]
fn accept_upload_gates_type_and_length() {
    assert!(accept_upload(vec![1], "image/png").is_ok());
    assert!(accept_upload(vec![1], "IMAGE/JPEG; charset=binary").is_ok());
    assert!(matches!(
        accept_upload(vec![1], "application/pdf"),
        Err(TwibbonError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        accept_upload(vec![1], "image/svg+xml"),
        Err(TwibbonError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        accept_upload(Vec::new(), "image/png"),
        Err(TwibbonError::EmptyFile)
    ));
}

#[test]
fn accepted_upload_normalizes_mime() {
    let u = accept_upload(vec![1, 2], " Image/WebP ").unwrap();
    assert_eq!(u.mime(), "image/webp");
    assert_eq!(u.bytes(), &[1, 2]);
}

#[test]
fn downscaled_dimensions_preserve_aspect() {
    assert_eq!(downscaled_dimensions(4000, 3000, 1350), (1350, 1013));
    assert_eq!(downscaled_dimensions(3000, 4000, 1350), (1013, 1350));
    assert_eq!(downscaled_dimensions(800, 600, 1350), (800, 600));
    assert_eq!(downscaled_dimensions(10000, 1, 100), (100, 1));
    assert_eq!(downscaled_dimensions(0, 0, 100), (0, 0));
}

#[test]
fn compress_bounds_longest_edge_and_reencodes_jpeg() {
    let bytes = encode(gradient_rgb(400, 300), ImageFormat::Png);
    let upload = accept_upload(bytes, "image/png").unwrap();
    let opts = CompressOpts {
        max_dimension_px: 135,
        ..CompressOpts::default()
    };
    let out = compress(&upload, opts).unwrap();
    assert_eq!((out.width, out.height), (135, 101));
    assert_eq!((out.source_width, out.source_height), (400, 300));
    assert_eq!(out.format, ImageFormat::Jpeg);

    let decoded = out.decode().unwrap();
    assert_eq!((decoded.width(), decoded.height()), (135, 101));
    assert_eq!(decoded.pixel(0, 0).map(|p| p.a), Some(255));
}

#[test]
fn compress_is_deterministic() {
    let bytes = encode(gradient_rgb(300, 200), ImageFormat::Png);
    let upload = accept_upload(bytes, "image/png").unwrap();
    let opts = CompressOpts {
        max_dimension_px: 64,
        ..CompressOpts::default()
    };
    let a = compress(&upload, opts).unwrap();
    let b = compress(&upload, opts).unwrap();
    assert_eq!(a.bytes, b.bytes);
}

#[test]
fn transparent_sources_stay_png() {
    let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        20,
        10,
        image::Rgba([200, 100, 50, 128]),
    ));
    let upload = accept_upload(encode(img, ImageFormat::Png), "image/png").unwrap();
    let out = compress(&upload, CompressOpts::default()).unwrap();
    assert_eq!(out.format, ImageFormat::Png);
    assert_eq!((out.width, out.height), (20, 10));

    let px = out.decode().unwrap().pixel(3, 3).unwrap();
    assert_eq!(px.a, 128);
    assert_eq!(px.r, ((200u16 * 128 + 127) / 255) as u8);
}

#[test]
fn corrupt_bytes_are_decode_errors() {
    let upload = accept_upload(vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3], "image/png").unwrap();
    assert!(matches!(
        compress(&upload, CompressOpts::default()),
        Err(TwibbonError::Decode(_))
    ));
    assert!(matches!(
        decode_image(b"not an image"),
        Err(TwibbonError::Decode(_))
    ));
}

#[test]
fn decoder_allocation_limit_is_enforced() {
    let bytes = encode(gradient_rgb(256, 256), ImageFormat::Png);
    let upload = accept_upload(bytes, "image/png").unwrap();
    let opts = CompressOpts {
        max_alloc_bytes: 1024,
        ..CompressOpts::default()
    };
    let err = compress(&upload, opts).unwrap_err();
    assert!(matches!(&err, TwibbonError::Decode(_)), "{err:?}");
    let msg = err.to_string();
    assert!(msg.contains("256x256") && msg.contains("196608") && msg.contains("1024"), "{msg}");

    // The same upload passes once the cap fits it.
    let roomy = CompressOpts {
        max_alloc_bytes: 4 * 1024 * 1024,
        ..CompressOpts::default()
    };
    assert!(compress(&upload, roomy).is_ok());
}

#[test]
fn prepare_photo_builds_cover_layer() {
    let bytes = encode(gradient_rgb(200, 100), ImageFormat::Png);
    let upload = accept_upload(bytes, "image/png").unwrap();
    let prepared = prepare_photo(&upload, CompressOpts::default(), PlacementPolicy::Cover).unwrap();
    assert_eq!(prepared.layer.pixels().width(), 200);
    let vp = Viewport::from_container(100.0, 1.0);
    assert_eq!(prepared.place_on_viewport(&vp), 1.0);
}
