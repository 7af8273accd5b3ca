// Preset unit tests
// Saving, storing and re-applying layer presets through the public API

use watermark_studio::watermark::*;

fn stamp() -> WatermarkLayer {
    WatermarkLayer::new("CONFIDENTIAL")
        .with_font("Courier", 72)
        .with_color(Color::new(200, 0, 0))
        .with_opacity(0.4)
        .with_rotation(-45)
        .with_effect(TextEffect::Emboss)
        .with_blend_mode(BlendMode::Overlay)
        .with_position(Anchor::Center)
}

#[test]
fn test_library_survives_json_storage() {
    let mut library = PresetLibrary::new();
    library.push(PresetSetting::from_layer(&stamp(), "confidential"));
    library.push(PresetSetting::from_layer(
        &WatermarkLayer::new("tile").with_pattern(PatternSettings::tiled(120, 30)),
        "tiled",
    ));

    let stored = library.to_json().unwrap();
    let loaded = PresetLibrary::from_json(&stored).unwrap();

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.names(), vec!["confidential", "tiled"]);
    let tiled = loaded.get("tiled").unwrap();
    assert!(tiled.enable_pattern);
    assert_eq!(tiled.pattern_spacing, 120);
    assert_eq!(tiled.pattern_angle, 30);
}

#[test]
fn test_applied_preset_renders_like_source_layer() {
    let source = stamp();
    let preset = PresetSetting::from_layer(&source, "confidential");

    let mut target = WatermarkLayer::new("");
    preset.apply_to(&mut target);

    let mut from_source = RecordingSurface::new(640, 480).unwrap();
    let mut from_preset = RecordingSurface::new(640, 480).unwrap();
    let base = image::RgbaImage::new(640, 480);
    let compositor = WatermarkCompositor::new();
    compositor.render(&mut from_source, &base, &[source]).unwrap();
    compositor.render(&mut from_preset, &base, &[target]).unwrap();

    assert_eq!(from_source.calls(), from_preset.calls());
}

#[test]
fn test_anchor_preset_keeps_target_custom_coordinates() {
    let mut target = WatermarkLayer::new("moved").at(15, 25);
    PresetSetting::from_layer(&stamp(), "centered").apply_to(&mut target);

    assert_eq!(target.position, Anchor::Center);
    assert_eq!(target.custom_x, Some(15));
    assert_eq!(target.custom_y, Some(25));
}

#[test]
fn test_library_json_is_a_plain_array_of_records() {
    let mut library = PresetLibrary::new();
    library.push(PresetSetting::from_layer(&stamp().at(1, 2), "one"));

    let value: serde_json::Value = serde_json::from_str(&library.to_json().unwrap()).unwrap();
    let record = &value.as_array().unwrap()[0];
    assert_eq!(record["name"], "one");
    assert_eq!(record["font"], "Courier");
    assert_eq!(record["color"], "#c80000");
    assert_eq!(record["size"], 72);
    assert_eq!(record["position"], "custom");
    assert_eq!(record["effect"], "emboss");
    assert_eq!(record["blendMode"], "overlay");
    assert!(record.get("id").is_none());
}

#[test]
fn test_malformed_library_is_invalid_preset() {
    let result = PresetLibrary::from_json(r#"[{"name": "no fields"}]"#);
    assert!(matches!(result, Err(WatermarkError::InvalidPreset(_))));
}
