//! Watermark compositing engine.
//!
//! Renders configurable text watermarks onto a raster surface. A render
//! pass clears the surface, draws the base image, then draws each layer in
//! order: anchored at one position, or tiled across the surface on a
//! rotated grid, using one of a fixed set of text effects.
//!
//! # Features
//!
//! - **Layers** with font, color, opacity, rotation, blend mode and effect
//! - **6 positioning modes**: four corners, center, and explicit coordinates
//! - **Pattern tiling** with independent grid angle
//! - **Effects**: none, outline, shadow, emboss, neon
//! - **Presets** in a portable JSON shape
//!
//! # Example
//!
//! ```ignore
//! use watermark_studio::watermark::*;
//!
//! let mut surface = PixmapSurface::new(800, 600, FontBook::system())?;
//! let layers = vec![
//!     WatermarkLayer::new("CONFIDENTIAL")
//!         .with_color(Color::new(255, 0, 0))
//!         .with_effect(TextEffect::Outline)
//!         .with_pattern(PatternSettings::tiled(200, 45)),
//! ];
//! WatermarkCompositor::new().render(&mut surface, &base, &layers)?;
//! ```

pub mod color;
pub mod compositor;
pub mod effects;
pub mod error;
pub mod fonts;
pub mod layer;
pub mod pattern;
pub mod pixmap_surface;
pub mod position;
pub mod preset;
pub mod recording;
pub mod surface;

// Re-export main types for convenience
pub use color::{parse_hex_color, Color};
pub use compositor::{RenderStats, WatermarkCompositor};
pub use effects::render_effect;
pub use error::WatermarkError;
pub use fonts::{FontBook, LoadedFace};
pub use layer::{
    Anchor, BlendMode, LayerDefaults, LayerId, LayerSet, PatternSettings, TextEffect,
    WatermarkLayer,
};
pub use pattern::{tile_origins, tile_pattern};
pub use pixmap_surface::PixmapSurface;
pub use position::{
    is_visible, resolve_position, PlacementPosition, SurfaceDimensions, TextExtent,
};
pub use preset::{PresetLibrary, PresetSetting};
pub use recording::{DrawCall, RecordingSurface, TextDraw};
pub use surface::{FontSpec, GraphicsState, RasterSurface, Shadow, StateStack, TextMetrics};
