use super::*;
use crate::foundation::core::{PixelBuffer, Rgba8Premul};
use crate::ingest::placement::PlacementPolicy;
use crate::layers::stack::{LayerStack, PhotoLayer};
use crate::transform::controller::Transform;
use crate::viewport::manager::Viewport;

fn snapshot(with_photo: bool) -> CompositionSnapshot {
    let vp = Viewport::from_container(16.0, 1.5);
    let mut stack = LayerStack::new();
    stack
        .set_frame(PixelBuffer::solid(32, 48, Rgba8Premul::transparent()), &vp)
        .unwrap();
    if with_photo {
        stack.replace_photo(PhotoLayer::new(
            PixelBuffer::solid(8, 8, Rgba8Premul::from_straight_rgba(0, 128, 255, 255)),
            PlacementPolicy::Cover,
        ));
    }
    let placed = Transform {
        scale: 3.0,
        ..Transform::default()
    };
    CompositionSnapshot::capture(&stack, &placed, vp)
}

#[test]
fn filename_uses_slug_and_extension() {
    assert_eq!(
        export_filename("hari-guru", ExportFormat::Png),
        "hari-guru-twibbon.png"
    );
    assert_eq!(export_filename("x", ExportFormat::Jpeg), "x-twibbon.jpg");
    assert_eq!(export_filename("  ", ExportFormat::WebP), "campaign-twibbon.webp");
}

#[test]
fn format_parsing_and_serde_names() {
    assert_eq!(ExportFormat::parse("JPEG").unwrap(), ExportFormat::Jpeg);
    assert_eq!(ExportFormat::parse("jpg").unwrap(), ExportFormat::Jpeg);
    assert_eq!(ExportFormat::parse("webp").unwrap(), ExportFormat::WebP);
    assert!(ExportFormat::parse("tiff").unwrap_err().is_input());
    assert_eq!(
        serde_json::to_string(&ExportFormat::WebP).unwrap(),
        "\"webp\""
    );
    let req: ExportRequest = serde_json::from_str(r#"{"format":"jpeg"}"#).unwrap();
    assert_eq!(req.multiplier, 2);
    assert_eq!(req.format, ExportFormat::Jpeg);
}

#[test]
fn request_validation() {
    assert!(ExportRequest::default().validate().is_ok());
    let zero = ExportRequest {
        multiplier: 0,
        ..ExportRequest::default()
    };
    assert!(matches!(zero.validate(), Err(TwibbonError::Validation(_))));
    let q = ExportRequest {
        quality: 0,
        ..ExportRequest::default()
    };
    assert!(q.validate().is_err());
}

#[test]
fn export_without_photo_is_empty_composition() {
    let mut c = CpuCompositor::new();
    let err = export(&mut c, &snapshot(false), &ExportRequest::default(), "s").unwrap_err();
    assert!(matches!(err, TwibbonError::EmptyComposition));
}

#[test]
fn png_export_has_multiplied_dimensions() {
    let mut c = CpuCompositor::new();
    let out = export(&mut c, &snapshot(true), &ExportRequest::default(), "demo").unwrap();
    assert_eq!(out.filename, "demo-twibbon.png");
    assert_eq!((out.width, out.height), (32, 48));

    let img = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (32, 48));
    let px = img.get_pixel(16, 24).0;
    assert!(px[0] <= 2 && px[1].abs_diff(128) <= 2 && px[2] >= 253, "{px:?}");
    assert_eq!(px[3], 255);
}

#[test]
fn jpeg_and_webp_exports_decode() {
    let mut c = CpuCompositor::new();
    for format in [ExportFormat::Jpeg, ExportFormat::WebP] {
        let req = ExportRequest {
            multiplier: 1,
            format,
            quality: 90,
        };
        let out = export(&mut c, &snapshot(true), &req, "demo").unwrap();
        let guessed = image::guess_format(&out.bytes).unwrap();
        assert_eq!(guessed, format.image_format());
        let img = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((img.width(), img.height()), (16, 24));
    }
}

#[test]
fn jpeg_flattens_transparency_on_white() {
    let rgb = flatten_on_white(&[0, 0, 0, 0, 100, 0, 0, 255]);
    assert_eq!(rgb, vec![255, 255, 255, 100, 0, 0]);
}
