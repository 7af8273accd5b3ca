// Studio unit tests
// End-to-end sessions: load, edit layers, transform, export

use image::{Rgba, RgbaImage};
use watermark_studio::config::{StudioConfig, TransformConfig};
use watermark_studio::studio::{ExportedImages, LoadOutcome, Studio};
use watermark_studio::transform::{decode_image, encode_png, parse_data_uri, CropSelection};
use watermark_studio::watermark::*;

fn studio() -> Studio {
    Studio::new(LayerDefaults::default(), FontBook::empty(), TransformConfig::default()).unwrap()
}

fn png(w: u32, h: u32) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(w, h, Rgba([30, 60, 90, 255]))).unwrap()
}

#[test]
fn test_new_layers_take_configured_defaults() {
    let config = StudioConfig::from_yaml_with_env(
        r##"
defaults:
  text: "ACME"
  color: "#336699"
  size: 32
  position: center
fonts:
  load_system_fonts: false
"##,
    )
    .unwrap();
    let mut studio = Studio::from_config(&config).unwrap();

    let first = studio.add_layer().unwrap();
    let second = studio.add_layer().unwrap();
    assert_ne!(first, second);

    let layer = studio.layer(&first).unwrap();
    assert_eq!(layer.text, "ACME");
    assert_eq!(layer.color, Color::new(0x33, 0x66, 0x99));
    assert_eq!(layer.size_px, 32);
    assert_eq!(layer.position, Anchor::Center);
}

#[test]
fn test_layer_edits_and_removal() {
    let mut studio = studio();
    let id = studio.add_layer().unwrap();
    studio.layer_mut(&id).unwrap().text = "edited".to_string();
    assert_eq!(studio.layer(&id).unwrap().text, "edited");

    let removed = studio.remove_layer(&id).unwrap();
    assert_eq!(removed.text, "edited");
    assert!(studio.layers().is_empty());
    assert!(matches!(
        studio.remove_layer(&id),
        Err(WatermarkError::MissingLayerData(_))
    ));
}

#[test]
fn test_duplicate_layer_id_rejected() {
    let mut studio = studio();
    let layer = WatermarkLayer::new("one");
    let copy = layer.clone();
    studio.add_layer_with(layer).unwrap();
    assert!(matches!(
        studio.add_layer_with(copy),
        Err(WatermarkError::DuplicateLayer(_))
    ));
}

#[test]
fn test_crop_then_resize_updates_surface() {
    let mut studio = studio();
    studio.load_image(&png(200, 100)).unwrap();

    studio
        .crop(&CropSelection::new((150.0, 80.0), (50.0, 20.0)))
        .unwrap();
    assert_eq!(studio.surface_dimensions(), Some((100, 60)));

    studio.resize(50.0, 30.0).unwrap();
    assert_eq!(studio.surface_dimensions(), Some((50, 30)));
    assert_eq!(studio.base_image().unwrap().dimensions(), (50, 30));
}

#[test]
fn test_invalid_transforms_leave_image_unchanged() {
    let mut studio = studio();
    studio.load_image(&png(40, 30)).unwrap();

    assert!(matches!(
        studio.crop(&CropSelection::new((5.0, 5.0), (5.0, 25.0))),
        Err(WatermarkError::EmptySelection)
    ));
    assert!(matches!(
        studio.resize(0.0, 10.0),
        Err(WatermarkError::InvalidDimensions(_))
    ));
    assert_eq!(studio.surface_dimensions(), Some((40, 30)));
}

#[test]
fn test_failed_render_rolls_back_crop() {
    let mut studio = studio();
    studio.load_image(&png(40, 30)).unwrap();
    let id = studio.add_layer().unwrap();
    studio.layer_mut(&id).unwrap().text = "unrenderable".to_string();

    assert!(matches!(
        studio.crop(&CropSelection::new((0.0, 0.0), (20.0, 10.0))),
        Err(WatermarkError::FontUnavailable(_))
    ));
    assert_eq!(studio.surface_dimensions(), Some((40, 30)));

    // Once the layer can render again the same crop goes through
    studio.layer_mut(&id).unwrap().text.clear();
    studio
        .crop(&CropSelection::new((0.0, 0.0), (20.0, 10.0)))
        .unwrap();
    assert_eq!(studio.surface_dimensions(), Some((20, 10)));
}

#[test]
fn test_transforms_require_an_image() {
    let mut studio = studio();
    assert!(matches!(
        studio.crop(&CropSelection::new((0.0, 0.0), (1.0, 1.0))),
        Err(WatermarkError::NoImageLoaded)
    ));
    assert!(matches!(
        studio.resize(10.0, 10.0),
        Err(WatermarkError::NoImageLoaded)
    ));
}

#[test]
fn test_export_without_text_layers_matches_original() {
    let mut studio = studio();
    studio.load_image(&png(12, 9)).unwrap();
    // Empty text is a no-op layer
    studio.add_layer().unwrap();

    let ExportedImages {
        original_image_src,
        watermarked_image_src,
    } = studio.export_current().unwrap();

    let (_, original) = parse_data_uri(&original_image_src).unwrap();
    let (_, watermarked) = parse_data_uri(&watermarked_image_src).unwrap();
    let original = decode_image(&original).unwrap();
    let watermarked = decode_image(&watermarked).unwrap();
    assert_eq!(original.dimensions(), (12, 9));
    assert_eq!(watermarked.dimensions(), (12, 9));
    assert_eq!(*watermarked.get_pixel(6, 4), Rgba([30, 60, 90, 255]));
}

#[test]
fn test_text_layer_without_fonts_reports_font_error() {
    let mut studio = studio();
    studio.load_image(&png(16, 16)).unwrap();
    let id = studio.add_layer().unwrap();
    studio.layer_mut(&id).unwrap().text = "needs a face".to_string();

    assert!(matches!(
        studio.downloadable(),
        Err(WatermarkError::FontUnavailable(_))
    ));
}

#[test]
fn test_saved_preset_moves_between_sessions() {
    let mut first = studio();
    let id = first
        .add_layer_with(
            WatermarkLayer::new("shared")
                .with_effect(TextEffect::Neon)
                .at(7, 9),
        )
        .unwrap();
    let mut library = PresetLibrary::new();
    library.push(first.save_preset(&id, "neon").unwrap());
    let stored = library.to_json().unwrap();

    let mut second = studio();
    let loaded = PresetLibrary::from_json(&stored).unwrap();
    let target = second
        .apply_preset_to_first_layer(loaded.get("neon").unwrap())
        .unwrap();

    let layer = second.layer(&target).unwrap();
    assert_eq!(layer.text, "shared");
    assert_eq!(layer.effect, TextEffect::Neon);
    assert_eq!((layer.custom_x, layer.custom_y), (Some(7), Some(9)));
}

#[tokio::test]
async fn test_set_base_image_supersedes_pending_load() {
    let mut studio = studio();
    let pending = studio.begin_load(png(30, 30)).unwrap();
    studio
        .set_base_image(decode_image(&png(8, 4)).unwrap())
        .unwrap();

    assert_eq!(studio.finish_load(pending).await.unwrap(), LoadOutcome::Superseded);
    assert_eq!(studio.surface_dimensions(), Some((8, 4)));
}
