//! Position calculation for watermark placement.
//!
//! Maps a named anchor (or explicit coordinates) plus the measured text
//! extents to the baseline origin the text is drawn from.
//!
//! The font size stands in for the text height; no ascent/descent metrics
//! are used. Positions are not clamped, so text may land partly or fully
//! outside the surface.
//!
//! # Example
//!
//! ```ignore
//! use watermark_studio::watermark::position::{resolve_position, SurfaceDimensions, TextExtent};
//! use watermark_studio::watermark::Anchor;
//!
//! let surface = SurfaceDimensions { width: 800, height: 600 };
//! let text = TextExtent { width: 120.0, height: 48.0 };
//!
//! let pos = resolve_position(Anchor::BottomRight, &surface, &text, None, None);
//! assert_eq!((pos.x, pos.y), (670.0, 590.0)); // 800 - 120 - 10, 600 - 10
//! ```

use super::Anchor;
use crate::constants::ANCHOR_MARGIN_PX;

/// Dimensions of the target surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDimensions {
    pub width: u32,
    pub height: u32,
}

/// Measured size of the text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    /// Font size in pixels, used as the height of the run
    pub height: f32,
}

/// Draw origin of a single watermark (text baseline start).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPosition {
    pub x: f32,
    pub y: f32,
}

impl PlacementPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Calculate the draw origin for a watermark.
///
/// # Arguments
///
/// * `anchor` - The configured anchor
/// * `surface` - Dimensions of the surface
/// * `text` - Measured width and height of the text
/// * `custom_x`, `custom_y` - Explicit coordinates, used only for `Anchor::Custom`
///   (each defaults to 0 when unset)
pub fn resolve_position(
    anchor: Anchor,
    surface: &SurfaceDimensions,
    text: &TextExtent,
    custom_x: Option<i32>,
    custom_y: Option<i32>,
) -> PlacementPosition {
    let w = surface.width as f32;
    let h = surface.height as f32;
    let m = ANCHOR_MARGIN_PX;

    match anchor {
        Anchor::TopLeft => PlacementPosition::new(m, text.height + m),
        Anchor::TopRight => PlacementPosition::new(w - text.width - m, text.height + m),
        Anchor::BottomLeft => PlacementPosition::new(m, h - m),
        Anchor::BottomRight => PlacementPosition::new(w - text.width - m, h - m),
        Anchor::Center => PlacementPosition::new((w - text.width) / 2.0, (h + text.height) / 2.0),
        Anchor::Custom => PlacementPosition::new(
            custom_x.unwrap_or(0) as f32,
            custom_y.unwrap_or(0) as f32,
        ),
    }
}

/// Check whether a text run drawn at `position` overlaps the surface.
///
/// The run is treated as the box from `(x, y - height)` to `(x + width, y)`.
pub fn is_visible(position: &PlacementPosition, surface: &SurfaceDimensions, text: &TextExtent) -> bool {
    let left = position.x;
    let right = position.x + text.width;
    let top = position.y - text.height;
    let bottom = position.y;

    right > 0.0 && left < surface.width as f32 && bottom > 0.0 && top < surface.height as f32
}
