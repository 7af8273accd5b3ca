//! RGBA colors for fills, strokes and shadows.
//!
//! Colors serialize as lowercase hex (`#rrggbb`, or `#rrggbbaa` when not
//! fully opaque) and parse from the forms a color picker or style string
//! produces: `#RGB`, `#RRGGBB`, `#RRGGBBAA`, `rgb(r, g, b)`,
//! `rgba(r, g, b, a)` and the names `white`, `black`, `transparent`.

use super::WatermarkError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// White color.
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub const fn transparent() -> Self {
        Self::rgba(0, 0, 0, 0)
    }

    /// Alpha as a fraction in [0, 1].
    pub fn alpha_f32(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Same color with its alpha scaled by `factor` (clamped to [0, 1]).
    pub fn with_alpha_scaled(self, factor: f32) -> Self {
        let factor = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            a: (self.a as f32 * factor).round() as u8,
            ..self
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse any supported color notation.
    pub fn parse(input: &str) -> Result<Self, WatermarkError> {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();

        match lower.as_str() {
            "white" => return Ok(Self::white()),
            "black" => return Ok(Self::black()),
            "transparent" => return Ok(Self::transparent()),
            _ => {}
        }

        if lower.starts_with('#') {
            return parse_hex_color(&lower);
        }

        if let Some(body) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_functional(body, trimmed);
        }

        Err(invalid(trimmed, "unrecognized color notation"))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = WatermarkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl From<Color> for tiny_skia::Color {
    fn from(color: Color) -> Self {
        tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

fn invalid(input: &str, reason: &str) -> WatermarkError {
    WatermarkError::InvalidColor(format!("'{}': {}", input, reason))
}

/// Parse a hex color string into RGBA components.
///
/// Supports #RGB, #RRGGBB and #RRGGBBAA formats.
///
/// # Examples
///
/// ```ignore
/// let white = parse_hex_color("#FFF").unwrap();
/// assert_eq!(white, Color::new(255, 255, 255));
///
/// let red = parse_hex_color("#FF0000").unwrap();
/// assert_eq!(red, Color::new(255, 0, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| invalid(hex, "color must start with '#'"))?;

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(hex, "invalid hex digit"));
    }

    let channel = |range: std::ops::Range<usize>| -> Result<u8, WatermarkError> {
        u8::from_str_radix(&digits[range], 16).map_err(|_| invalid(hex, "invalid hex digit"))
    };

    match digits.len() {
        // Each digit is doubled: 0xF -> 0xFF, 0xA -> 0xAA
        3 => Ok(Color::new(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        6 => Ok(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        8 => Ok(Color::rgba(
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        )),
        n => Err(invalid(
            hex,
            &format!("expected 3, 6 or 8 hex digits, got {}", n),
        )),
    }
}

fn parse_functional(body: &str, original: &str) -> Result<Color, WatermarkError> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(invalid(original, "expected 3 or 4 components"));
    }

    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        let value: f32 = part
            .parse()
            .map_err(|_| invalid(original, "component is not a number"))?;
        *slot = value.round().clamp(0.0, 255.0) as u8;
    }

    let alpha = match parts.get(3) {
        Some(part) => {
            let value: f32 = part
                .parse()
                .map_err(|_| invalid(original, "alpha is not a number"))?;
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };

    Ok(Color::rgba(rgb[0], rgb[1], rgb[2], alpha))
}
