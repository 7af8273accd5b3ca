// Constants module - centralized default values and fixed rendering constants
//
// Defaults here seed new layers and the configuration file. The effect
// constants are fixed: they are part of each effect's look and are not
// configurable per layer.

use crate::watermark::Color;

// =============================================================================
// Layer defaults
// =============================================================================

/// Default font family for new layers
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Default text color for new layers
pub const DEFAULT_COLOR: Color = Color::black();

/// Default layer opacity
pub const DEFAULT_OPACITY: f32 = 0.5;

/// Default font size in pixels
pub const DEFAULT_FONT_SIZE_PX: u32 = 48;

/// Default distance between pattern tiles in pixels
pub const DEFAULT_PATTERN_SPACING: i32 = 100;

// =============================================================================
// Layout
// =============================================================================

/// Distance kept between an anchored watermark and the surface edges
pub const ANCHOR_MARGIN_PX: f32 = 10.0;

// =============================================================================
// Effects
// =============================================================================

/// Color and stroke width of the outline effect
pub const OUTLINE_COLOR: Color = Color::white();
pub const OUTLINE_STROKE_WIDTH: f32 = 3.0;

/// Drop shadow used by the shadow effect
pub const SHADOW_COLOR: Color = Color::rgba(0, 0, 0, 128);
pub const SHADOW_BLUR: f32 = 5.0;
pub const SHADOW_OFFSET: (f32, f32) = (3.0, 3.0);

/// Light highlight and dark shade used by the emboss effect
pub const EMBOSS_HIGHLIGHT_COLOR: Color = Color::white();
pub const EMBOSS_SHADE_COLOR: Color = Color::rgba(0, 0, 0, 128);
pub const EMBOSS_BLUR: f32 = 1.0;
pub const EMBOSS_HIGHLIGHT_OFFSET: (f32, f32) = (-1.0, -1.0);
pub const EMBOSS_SHADE_OFFSET: (f32, f32) = (1.0, 1.0);

/// Glow radius and stroke width used by the neon effect
pub const NEON_BLUR: f32 = 10.0;
pub const NEON_STROKE_WIDTH: f32 = 2.0;

// =============================================================================
// Transforms
// =============================================================================

/// Largest surface (in pixels) a resize may produce
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;

/// Fallback family tried when a requested font family is not installed
pub const DEFAULT_FALLBACK_FAMILY: &str = "sans-serif";
