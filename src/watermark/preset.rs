//! Named layer presets.
//!
//! A [`PresetSetting`] is a named copy of one layer's settings (without its
//! id) in the JSON shape stored by the preset collaborator:
//!
//! ```json
//! {
//!   "name": "Draft stamp",
//!   "text": "DRAFT",
//!   "font": "Arial",
//!   "color": "#ff0000",
//!   "opacity": 0.5,
//!   "size": 48,
//!   "position": "custom",
//!   "customX": 40,
//!   "customY": 120,
//!   "rotation": 0,
//!   "effect": "outline",
//!   "enablePattern": false,
//!   "patternSpacing": 100,
//!   "patternAngle": 0,
//!   "blendMode": "normal"
//! }
//! ```
//!
//! Numeric fields also accept numeric strings (`"0.5"`, `"48"`), which is
//! how older records stored raw form values; a blank string leaves a
//! coordinate unset. `customX`/`customY` are only written when the position
//! is `custom` and the coordinate is set. Unknown fields are ignored.

use super::{Anchor, BlendMode, Color, PatternSettings, TextEffect, WatermarkError, WatermarkLayer};
use serde::{Deserialize, Serialize};

/// A named snapshot of one layer's settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetSetting {
    #[serde(default)]
    pub name: String,
    pub text: String,
    pub font: String,
    pub color: Color,
    #[serde(deserialize_with = "lenient::f32")]
    pub opacity: f32,
    #[serde(deserialize_with = "lenient::u32")]
    pub size: u32,
    pub position: Anchor,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i32"
    )]
    pub custom_x: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_i32"
    )]
    pub custom_y: Option<i32>,
    #[serde(deserialize_with = "lenient::i32")]
    pub rotation: i32,
    pub effect: TextEffect,
    #[serde(deserialize_with = "lenient::bool")]
    pub enable_pattern: bool,
    #[serde(deserialize_with = "lenient::i32")]
    pub pattern_spacing: i32,
    #[serde(deserialize_with = "lenient::i32")]
    pub pattern_angle: i32,
    /// Older records predate blend modes
    #[serde(default)]
    pub blend_mode: BlendMode,
}

impl PresetSetting {
    /// Capture a layer's settings under `name`.
    pub fn from_layer(layer: &WatermarkLayer, name: impl Into<String>) -> Self {
        let custom = layer.position == Anchor::Custom;
        Self {
            name: name.into(),
            text: layer.text.clone(),
            font: layer.font.clone(),
            color: layer.color,
            opacity: layer.opacity,
            size: layer.size_px,
            position: layer.position,
            custom_x: layer.custom_x.filter(|_| custom),
            custom_y: layer.custom_y.filter(|_| custom),
            rotation: layer.rotation_deg,
            effect: layer.effect,
            enable_pattern: layer.pattern.enabled,
            pattern_spacing: layer.pattern.spacing,
            pattern_angle: layer.pattern.angle_deg,
            blend_mode: layer.blend_mode,
        }
    }

    /// Write the preset's settings onto `layer`, keeping its id.
    ///
    /// Custom coordinates are only written for a `custom` position; a layer
    /// switched to an anchor keeps its previous coordinates.
    pub fn apply_to(&self, layer: &mut WatermarkLayer) {
        layer.text = self.text.clone();
        layer.font = self.font.clone();
        layer.color = self.color;
        layer.opacity = self.opacity;
        layer.size_px = self.size;
        layer.position = self.position;
        layer.rotation_deg = self.rotation;
        layer.effect = self.effect;
        layer.blend_mode = self.blend_mode;
        layer.pattern = PatternSettings {
            enabled: self.enable_pattern,
            spacing: self.pattern_spacing,
            angle_deg: self.pattern_angle,
        };

        if self.position == Anchor::Custom {
            layer.custom_x = self.custom_x;
            layer.custom_y = self.custom_y;
        }
    }
}

/// Ordered list of saved presets, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetLibrary {
    presets: Vec<PresetSetting>,
}

impl PresetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a preset. Names need not be unique.
    pub fn push(&mut self, preset: PresetSetting) {
        self.presets.push(preset);
    }

    /// The most recently saved preset with this name.
    pub fn get(&self, name: &str) -> Option<&PresetSetting> {
        self.presets.iter().rev().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PresetSetting> {
        self.presets.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn to_json(&self) -> Result<String, WatermarkError> {
        serde_json::to_string_pretty(self).map_err(|e| WatermarkError::InvalidPreset(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, WatermarkError> {
        serde_json::from_str(json).map_err(|e| WatermarkError::InvalidPreset(e.to_string()))
    }
}

/// Deserializers that accept JSON numbers or numeric strings.
mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Number(f64),
        Text(String),
    }

    fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Numeric::deserialize(deserializer)? {
            Numeric::Number(n) => Ok(Some(n)),
            Numeric::Text(s) if s.trim().is_empty() => Ok(None),
            Numeric::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a number, got '{}'", s))),
        }
    }

    fn required<E: Error>(value: Option<f64>) -> Result<f64, E> {
        value
            .filter(|n| n.is_finite())
            .ok_or_else(|| E::custom("expected a finite number"))
    }

    pub fn f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        Ok(required::<D::Error>(number(deserializer)?)? as f32)
    }

    pub fn i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        Ok(required::<D::Error>(number(deserializer)?)?.round() as i32)
    }

    pub fn u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let n = required::<D::Error>(number(deserializer)?)?;
        if n < 0.0 {
            return Err(D::Error::custom(format!("expected a non-negative number, got {}", n)));
        }
        Ok(n.round() as u32)
    }

    pub fn opt_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        Ok(number(deserializer)?
            .filter(|n| n.is_finite())
            .map(|n| n.round() as i32))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    pub fn bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "1" => Ok(true),
                "false" | "off" | "0" | "" => Ok(false),
                _ => Err(D::Error::custom(format!("expected a boolean, got '{}'", s))),
            },
        }
    }
}
