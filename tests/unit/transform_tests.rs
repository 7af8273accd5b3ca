// Transform pipeline unit tests
// Crop, resize and the codec helpers used for import and export

use image::{Rgba, RgbaImage};
use rstest::rstest;
use watermark_studio::transform::*;
use watermark_studio::watermark::WatermarkError;

fn quadrants(w: u32, h: u32) -> BaseImage {
    let img = RgbaImage::from_fn(w, h, |x, y| match (x < w / 2, y < h / 2) {
        (true, true) => Rgba([255, 0, 0, 255]),
        (false, true) => Rgba([0, 255, 0, 255]),
        (true, false) => Rgba([0, 0, 255, 255]),
        (false, false) => Rgba([255, 255, 0, 255]),
    });
    BaseImage::new(img).unwrap()
}

#[test]
fn test_crop_reversed_drag_selects_same_region() {
    let base = quadrants(100, 80);
    let forward = crop(&base, &CropSelection::new((50.0, 40.0), (100.0, 80.0))).unwrap();
    let backward = crop(&base, &CropSelection::new((100.0, 80.0), (50.0, 40.0))).unwrap();

    assert_eq!(forward, backward);
    assert_eq!(forward.dimensions(), (50, 40));
    assert!(forward.pixels().all(|p| *p == Rgba([255, 255, 0, 255])));
}

#[test]
fn test_crop_scales_from_displayed_size() {
    // Shown at half size: a 25x20 drag covers 50x40 image pixels
    let base = quadrants(100, 80);
    let selection = CropSelection::new((0.0, 0.0), (25.0, 20.0)).displayed_at(50.0, 40.0);

    let cropped = crop(&base, &selection).unwrap();
    assert_eq!(cropped.dimensions(), (50, 40));
    assert!(cropped.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
}

#[rstest]
#[case((10.0, 10.0), (10.0, 50.0))]
#[case((10.0, 10.0), (50.0, 10.0))]
#[case((-30.0, -30.0), (-5.0, -5.0))]
fn test_degenerate_crop_is_empty_selection(#[case] start: (f64, f64), #[case] end: (f64, f64)) {
    let base = quadrants(100, 80);
    let result = crop(&base, &CropSelection::new(start, end));
    assert!(matches!(result, Err(WatermarkError::EmptySelection)));
}

#[test]
fn test_crop_is_clamped_to_image() {
    let base = quadrants(100, 80);
    let rect = CropSelection::new((-20.0, 70.0), (40.0, 500.0))
        .to_image_rect(100, 80)
        .unwrap();
    assert_eq!(
        rect,
        ImageRect {
            x: 0,
            y: 70,
            width: 40,
            height: 10
        }
    );
    assert_eq!(
        crop(&base, &CropSelection::new((-20.0, 70.0), (40.0, 500.0)))
            .unwrap()
            .dimensions(),
        (40, 10)
    );
}

#[rstest]
#[case(ResizeFilter::Nearest)]
#[case(ResizeFilter::Bilinear)]
#[case(ResizeFilter::Lanczos3)]
fn test_resize_hits_target_with_every_filter(#[case] filter: ResizeFilter) {
    let base = quadrants(64, 48);
    let resized = resize(&base, 32.0, 96.0, filter, 100_000_000).unwrap();
    assert_eq!(resized.dimensions(), (32, 96));
}

#[test]
fn test_resize_rounds_fractional_targets() {
    let base = quadrants(64, 48);
    let resized = resize(&base, 20.4, 10.6, ResizeFilter::Bilinear, 100_000_000).unwrap();
    assert_eq!(resized.dimensions(), (20, 11));
}

#[rstest]
#[case(0.0, 10.0)]
#[case(10.0, -1.0)]
#[case(f64::NAN, 10.0)]
#[case(10.0, f64::INFINITY)]
#[case(0.2, 10.0)]
fn test_resize_rejects_invalid_targets(#[case] width: f64, #[case] height: f64) {
    let base = quadrants(8, 8);
    let result = resize(&base, width, height, ResizeFilter::Bilinear, 100_000_000);
    assert!(matches!(result, Err(WatermarkError::InvalidDimensions(_))));
}

#[test]
fn test_nearest_upscale_keeps_quadrant_colors() {
    let base = quadrants(4, 4);
    let resized = resize(&base, 8.0, 8.0, ResizeFilter::Nearest, 100_000_000).unwrap();
    assert_eq!(*resized.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    assert_eq!(*resized.get_pixel(7, 0), Rgba([0, 255, 0, 255]));
    assert_eq!(*resized.get_pixel(0, 7), Rgba([0, 0, 255, 255]));
    assert_eq!(*resized.get_pixel(7, 7), Rgba([255, 255, 0, 255]));
}

#[test]
fn test_png_data_uri_decodes_back_to_pixels() {
    let base = quadrants(6, 4);
    let uri = png_data_uri(base.as_rgba()).unwrap();

    let (mime, bytes) = parse_data_uri(&uri).unwrap();
    assert_eq!(mime, "image/png");
    let decoded = decode_image(&bytes).unwrap();
    assert_eq!(decoded, base);
}

#[test]
fn test_decode_rejects_non_images() {
    assert!(matches!(
        decode_image(b"definitely not an image"),
        Err(WatermarkError::DecodeFailed(_))
    ));
    assert!(matches!(
        parse_data_uri("https://example.com/a.png"),
        Err(WatermarkError::DecodeFailed(_))
    ));
}

#[tokio::test]
async fn test_async_decode_matches_sync() {
    let bytes = encode_png(quadrants(10, 6).as_rgba()).unwrap();
    let sync = decode_image(&bytes).unwrap();
    let decoded = decode_image_async(bytes).await.unwrap();
    assert_eq!(decoded, sync);
}
