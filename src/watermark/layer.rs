//! Watermark layer model.
//!
//! A [`WatermarkLayer`] is the strongly-typed configuration of one text
//! watermark. Layers live in an ordered [`LayerSet`]; later layers paint
//! over earlier ones.
//!
//! Enum values read from presets or config files are parsed leniently:
//! unknown names fall back to a documented default instead of failing.

use super::{Color, WatermarkError};
use crate::constants::{
    DEFAULT_COLOR, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE_PX, DEFAULT_OPACITY,
    DEFAULT_PATTERN_SPACING,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Opaque, unique identifier of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for LayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Implements string (de)serialization for a fieldless enum whose parser
/// never fails.
macro_rules! lenient_string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(<$ty>::parse_lossy(&raw))
            }
        }
    };
}

/// Named placement of a watermark on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Anchor {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
    /// Explicit coordinates taken from the layer's `custom_x`/`custom_y`
    Custom,
}

impl Anchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "topLeft",
            Self::TopRight => "topRight",
            Self::BottomLeft => "bottomLeft",
            Self::BottomRight => "bottomRight",
            Self::Center => "center",
            Self::Custom => "custom",
        }
    }

    /// Parse an anchor name. Unknown names fall back to `TopLeft`.
    ///
    /// Accepts the camelCase names used by presets as well as kebab-case
    /// and snake_case spellings.
    pub fn parse_lossy(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "topleft" => Self::TopLeft,
            "topright" => Self::TopRight,
            "bottomleft" => Self::BottomLeft,
            "bottomright" => Self::BottomRight,
            "center" | "centre" => Self::Center,
            "custom" => Self::Custom,
            _ => {
                tracing::warn!(position = raw, "Unknown position, falling back to topLeft");
                Self::TopLeft
            }
        }
    }
}

lenient_string_serde!(Anchor);

/// Fixed text rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEffect {
    #[default]
    None,
    Outline,
    Shadow,
    Emboss,
    Neon,
}

impl TextEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Outline => "outline",
            Self::Shadow => "shadow",
            Self::Emboss => "emboss",
            Self::Neon => "neon",
        }
    }

    /// Parse an effect name. Unknown names fall back to `None`.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Self::None,
            "outline" => Self::Outline,
            "shadow" => Self::Shadow,
            "emboss" => Self::Emboss,
            "neon" => Self::Neon,
            _ => {
                tracing::warn!(effect = raw, "Unknown effect, falling back to none");
                Self::None
            }
        }
    }
}

lenient_string_serde!(TextEffect);

/// Compositing operator used when a layer is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
}

impl BlendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
        }
    }

    /// Parse a blend mode name. `source-over` is accepted as `Normal`;
    /// unknown names fall back to `Normal`.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" | "source-over" | "" => Self::Normal,
            "multiply" => Self::Multiply,
            "screen" => Self::Screen,
            "overlay" => Self::Overlay,
            "darken" => Self::Darken,
            "lighten" => Self::Lighten,
            _ => {
                tracing::warn!(blend_mode = raw, "Unknown blend mode, falling back to normal");
                Self::Normal
            }
        }
    }
}

lenient_string_serde!(BlendMode);

impl From<BlendMode> for tiny_skia::BlendMode {
    fn from(mode: BlendMode) -> Self {
        match mode {
            BlendMode::Normal => tiny_skia::BlendMode::SourceOver,
            BlendMode::Multiply => tiny_skia::BlendMode::Multiply,
            BlendMode::Screen => tiny_skia::BlendMode::Screen,
            BlendMode::Overlay => tiny_skia::BlendMode::Overlay,
            BlendMode::Darken => tiny_skia::BlendMode::Darken,
            BlendMode::Lighten => tiny_skia::BlendMode::Lighten,
        }
    }
}

/// Repeating-grid settings of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternSettings {
    pub enabled: bool,
    /// Distance between tile origins in pixels; must be positive when enabled
    pub spacing: i32,
    /// Rotation of each tile, independent of the layer's glyph rotation
    pub angle_deg: i32,
}

impl PatternSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            spacing: DEFAULT_PATTERN_SPACING,
            angle_deg: 0,
        }
    }

    pub fn tiled(spacing: i32, angle_deg: i32) -> Self {
        Self {
            enabled: true,
            spacing,
            angle_deg,
        }
    }

    /// Returns the spacing as a step size, failing for non-positive values.
    pub fn step(&self) -> Result<u32, WatermarkError> {
        if self.spacing <= 0 {
            return Err(WatermarkError::InvalidPattern(format!(
                "spacing must be a positive integer, got {}",
                self.spacing
            )));
        }
        Ok(self.spacing as u32)
    }
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self::disabled()
    }
}

fn default_font() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_color() -> Color {
    DEFAULT_COLOR
}

fn default_opacity() -> f32 {
    DEFAULT_OPACITY
}

fn default_size() -> u32 {
    DEFAULT_FONT_SIZE_PX
}

fn default_spacing() -> i32 {
    DEFAULT_PATTERN_SPACING
}

/// Values given to every newly created layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDefaults {
    #[serde(default)]
    pub text: String,

    /// Font family (default: Arial)
    #[serde(default = "default_font")]
    pub font: String,

    /// Text color (default: #000000)
    #[serde(default = "default_color")]
    pub color: Color,

    /// Opacity from 0.0 to 1.0 (default: 0.5)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Font size in pixels (default: 48)
    #[serde(default = "default_size")]
    pub size: u32,

    #[serde(default)]
    pub position: Anchor,

    /// Glyph rotation in degrees (default: 0)
    #[serde(default)]
    pub rotation: i32,

    #[serde(default)]
    pub effect: TextEffect,

    #[serde(default)]
    pub blend_mode: BlendMode,

    #[serde(default)]
    pub enable_pattern: bool,

    /// Pattern tile spacing in pixels (default: 100)
    #[serde(default = "default_spacing")]
    pub pattern_spacing: i32,

    #[serde(default)]
    pub pattern_angle: i32,
}

impl Default for LayerDefaults {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: default_font(),
            color: default_color(),
            opacity: default_opacity(),
            size: default_size(),
            position: Anchor::default(),
            rotation: 0,
            effect: TextEffect::default(),
            blend_mode: BlendMode::default(),
            enable_pattern: false,
            pattern_spacing: default_spacing(),
            pattern_angle: 0,
        }
    }
}

impl LayerDefaults {
    /// Validate the defaults.
    pub fn validate(&self) -> Result<(), String> {
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!(
                "Default opacity must be a finite value between 0.0 and 1.0, got {}",
                self.opacity
            ));
        }
        if self.size == 0 {
            return Err("Default font size must be positive".to_string());
        }
        if self.pattern_spacing <= 0 {
            return Err(format!(
                "Default pattern spacing must be positive, got {}",
                self.pattern_spacing
            ));
        }
        if self.font.trim().is_empty() {
            return Err("Default font family cannot be empty".to_string());
        }
        Ok(())
    }
}

/// One configured text watermark.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkLayer {
    pub id: LayerId,
    /// Text to draw; an empty string makes the layer a no-op
    pub text: String,
    /// Logical font family, resolved by the rendering surface
    pub font: String,
    pub color: Color,
    /// Intended range [0, 1]; see [`WatermarkLayer::effective_opacity`]
    pub opacity: f32,
    pub size_px: u32,
    pub position: Anchor,
    pub custom_x: Option<i32>,
    pub custom_y: Option<i32>,
    /// Rotation of the glyph run about its own origin
    pub rotation_deg: i32,
    pub effect: TextEffect,
    pub blend_mode: BlendMode,
    pub pattern: PatternSettings,
}

impl WatermarkLayer {
    /// Create a layer with a fresh id from the given defaults.
    pub fn from_defaults(defaults: &LayerDefaults) -> Self {
        Self {
            id: LayerId::new(),
            text: defaults.text.clone(),
            font: defaults.font.clone(),
            color: defaults.color,
            opacity: defaults.opacity,
            size_px: defaults.size,
            position: defaults.position,
            custom_x: None,
            custom_y: None,
            rotation_deg: defaults.rotation,
            effect: defaults.effect,
            blend_mode: defaults.blend_mode,
            pattern: PatternSettings {
                enabled: defaults.enable_pattern,
                spacing: defaults.pattern_spacing,
                angle_deg: defaults.pattern_angle,
            },
        }
    }

    /// Create a layer with built-in defaults and the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self::from_defaults(&LayerDefaults::default()).with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size_px: u32) -> Self {
        self.font = family.into();
        self.size_px = size_px;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_position(mut self, position: Anchor) -> Self {
        self.position = position;
        self
    }

    /// Place the layer at explicit coordinates.
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.position = Anchor::Custom;
        self.custom_x = Some(x);
        self.custom_y = Some(y);
        self
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation_deg = degrees;
        self
    }

    pub fn with_effect(mut self, effect: TextEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    pub fn with_pattern(mut self, pattern: PatternSettings) -> Self {
        self.pattern = pattern;
        self
    }

    /// True when rendering this layer draws nothing.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Opacity clamped into [0, 1]; NaN renders as fully transparent.
    pub fn effective_opacity(&self) -> f32 {
        if self.opacity.is_nan() {
            0.0
        } else {
            self.opacity.clamp(0.0, 1.0)
        }
    }

    /// Font size with a floor of one pixel.
    pub fn effective_size_px(&self) -> u32 {
        self.size_px.max(1)
    }
}

/// Ordered collection of layers with unique ids.
#[derive(Debug, Clone, Default)]
pub struct LayerSet {
    layers: Vec<WatermarkLayer>,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer; it will paint over every existing layer.
    pub fn add(&mut self, layer: WatermarkLayer) -> Result<LayerId, WatermarkError> {
        if self.contains(&layer.id) {
            return Err(WatermarkError::DuplicateLayer(layer.id.to_string()));
        }
        let id = layer.id.clone();
        self.layers.push(layer);
        Ok(id)
    }

    /// Remove a layer, returning it.
    pub fn remove(&mut self, id: &LayerId) -> Result<WatermarkLayer, WatermarkError> {
        let index = self
            .layers
            .iter()
            .position(|layer| &layer.id == id)
            .ok_or_else(|| WatermarkError::MissingLayerData(id.to_string()))?;
        Ok(self.layers.remove(index))
    }

    pub fn get(&self, id: &LayerId) -> Option<&WatermarkLayer> {
        self.layers.iter().find(|layer| &layer.id == id)
    }

    pub fn get_mut(&mut self, id: &LayerId) -> Option<&mut WatermarkLayer> {
        self.layers.iter_mut().find(|layer| &layer.id == id)
    }

    /// Like [`LayerSet::get_mut`] but reports a missing layer as an error.
    pub fn require_mut(&mut self, id: &LayerId) -> Result<&mut WatermarkLayer, WatermarkError> {
        self.get_mut(id)
            .ok_or_else(|| WatermarkError::MissingLayerData(id.to_string()))
    }

    pub fn contains(&self, id: &LayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn first_id(&self) -> Option<&LayerId> {
        self.layers.first().map(|layer| &layer.id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in paint order.
    pub fn as_slice(&self) -> &[WatermarkLayer] {
        &self.layers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WatermarkLayer> {
        self.layers.iter()
    }
}
