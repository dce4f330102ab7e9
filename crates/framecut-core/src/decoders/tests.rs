//! Tests for image decoding

use super::*;
use image::{ImageBuffer, ImageFormat, Luma, Rgb};
use std::io::Cursor;

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

#[test]
fn test_decode_png_bytes() {
    let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(12, 8, Rgb([10u8, 20, 30])));
    let decoded = decode_bytes(&encode(&image, ImageFormat::Png), "strip").unwrap();

    assert_eq!(decoded.name, "strip");
    assert_eq!((decoded.width(), decoded.height()), (12, 8));
    assert!(decoded.source.is_none());
}

#[test]
fn test_decode_16bit_tiff_keeps_depth() {
    let image = DynamicImage::ImageLuma16(ImageBuffer::from_pixel(6, 4, Luma([40000u16])));
    let decoded = decode_bytes(&encode(&image, ImageFormat::Tiff), "scan16").unwrap();

    assert_eq!(decoded.image.color(), image::ColorType::L16);
    let gray = decoded.to_gray().get_pixel(0, 0)[0];
    assert!((155..=156).contains(&gray), "unexpected 8-bit value {}", gray);
}

#[test]
fn test_decode_garbage_is_invalid_input() {
    let err = decode_bytes(b"definitely not an image", "junk").unwrap_err();
    assert!(matches!(err, FrameError::InvalidInput { ref name, .. } if name == "junk"));

    let err = decode_bytes(&[], "empty").unwrap_err();
    assert!(matches!(err, FrameError::InvalidInput { .. }));
}

#[test]
fn test_zero_area_rejected() {
    let image = DynamicImage::ImageLuma8(ImageBuffer::new(0, 10));
    assert!(matches!(
        DecodedImage::new("flat", image),
        Err(FrameError::InvalidInput { .. })
    ));
}

#[test]
fn test_load_image_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roll_07.png");
    DynamicImage::ImageLuma8(ImageBuffer::from_pixel(5, 5, Luma([200u8])))
        .save(&path)
        .unwrap();

    let decoded = load_image(&path).unwrap();
    assert_eq!(decoded.name, "roll_07");
    assert_eq!(decoded.source.as_deref(), Some(path.as_path()));
}

#[test]
fn test_load_image_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello").unwrap();

    assert!(matches!(
        load_image(&path),
        Err(FrameError::InvalidInput { .. })
    ));
}

#[test]
fn test_load_image_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.tif");
    assert!(matches!(load_image(&path), Err(FrameError::Io { .. })));
}

#[test]
fn test_supported_paths() {
    assert!(is_supported_path(Path::new("a/b/scan.TIF")));
    assert!(is_supported_path(Path::new("scan.jpeg")));
    assert!(!is_supported_path(Path::new("scan.cr2")));
    assert!(!is_supported_path(Path::new("scan")));
}
