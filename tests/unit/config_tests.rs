// Configuration module unit tests
// Loads configuration files from disk the way the command line tool does

use std::io::Write;
use tempfile::NamedTempFile;
use watermark_studio::config::*;
use watermark_studio::transform::ResizeFilter;
use watermark_studio::watermark::{Anchor, BlendMode, Color, TextEffect};

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(yaml.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_can_load_config_from_file() {
    let file = write_config(
        r##"
defaults:
  font: "Georgia"
  size: 64
  opacity: 0.75
transform:
  resize_filter: nearest
"##,
    );

    let config = StudioConfig::from_file(file.path()).expect("Failed to load config");
    assert_eq!(config.defaults.font, "Georgia");
    assert_eq!(config.defaults.size, 64);
    assert_eq!(config.defaults.opacity, 0.75);
    assert_eq!(config.transform.resize_filter, ResizeFilter::Nearest);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_is_reported() {
    let err = StudioConfig::from_file("/nonexistent/watermark-studio.yaml").unwrap_err();
    assert!(err.contains("Failed to read config file"));
}

#[test]
fn test_layers_use_preset_shape() {
    let file = write_config(
        r##"
layers:
  - name: "corner"
    text: "(c) ACME"
    font: "Arial"
    color: "#ffffff"
    opacity: 0.8
    size: 24
    position: "bottomRight"
    rotation: 0
    effect: "shadow"
    enablePattern: false
    patternSpacing: 100
    patternAngle: 0
  - name: "stamp"
    text: "DRAFT"
    font: "Arial"
    color: "rgba(255, 0, 0, 0.5)"
    opacity: "0.3"
    size: "96"
    position: "custom"
    customX: 40
    customY: 200
    rotation: -30
    effect: "outline"
    enablePattern: false
    patternSpacing: 100
    patternAngle: 0
    blendMode: "multiply"
"##,
    );

    let config = StudioConfig::from_file(file.path()).unwrap();
    assert_eq!(config.layers.len(), 2);

    let corner = &config.layers[0];
    assert_eq!(corner.position, Anchor::BottomRight);
    assert_eq!(corner.effect, TextEffect::Shadow);
    assert_eq!(corner.color, Color::white());
    assert_eq!(corner.blend_mode, BlendMode::Normal);

    let stamp = &config.layers[1];
    assert_eq!(stamp.opacity, 0.3);
    assert_eq!(stamp.size, 96);
    assert_eq!(stamp.custom_x, Some(40));
    assert_eq!(stamp.rotation, -30);
    assert_eq!(stamp.blend_mode, BlendMode::Multiply);
    assert!(config.validate().is_ok());
}

#[test]
fn test_layer_with_zero_pattern_spacing_fails_validation() {
    let file = write_config(
        r##"
layers:
  - text: "tile"
    font: "Arial"
    color: "#000"
    opacity: 0.5
    size: 48
    position: "center"
    rotation: 0
    effect: "none"
    enablePattern: true
    patternSpacing: 0
    patternAngle: 45
"##,
    );

    let config = StudioConfig::from_file(file.path()).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.contains("non-positive spacing"));
}

#[test]
fn test_unknown_enum_values_fall_back() {
    let yaml = r##"
defaults:
  position: "middle-ish"
  effect: "sparkle"
  blend_mode: "dodge"
"##;
    let config = StudioConfig::from_yaml_with_env(yaml).unwrap();
    assert_eq!(config.defaults.position, Anchor::TopLeft);
    assert_eq!(config.defaults.effect, TextEffect::None);
    assert_eq!(config.defaults.blend_mode, BlendMode::Normal);
}

#[test]
fn test_logging_filter_directive_is_accepted() {
    let yaml = "logging:\n  level: \"info,watermark_studio=debug\"\n  format: json\n";
    let config = StudioConfig::from_yaml_with_env(yaml).unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_default_opacity_fails_validation() {
    let config = StudioConfig::from_yaml_with_env("defaults:\n  opacity: 1.5\n").unwrap();
    assert!(config.validate().is_err());
}
