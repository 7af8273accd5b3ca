//! Watermark compositor for rendering layers onto a surface.
//!
//! A render pass is a full redraw: the surface is cleared, the base image is
//! blitted to cover it, then every layer with text is drawn in order. Later
//! layers paint over earlier ones under their own blend mode.
//!
//! Every layer is checked before the surface is touched (pattern spacing,
//! and a font face for its text), so a failing render leaves the previous
//! frame intact.
//!
//! # Example
//!
//! ```ignore
//! use watermark_studio::watermark::{FontBook, PixmapSurface, WatermarkCompositor, WatermarkLayer};
//!
//! let mut surface = PixmapSurface::new(base.width(), base.height(), FontBook::system())?;
//! let layers = vec![WatermarkLayer::new("CONFIDENTIAL")];
//!
//! let stats = WatermarkCompositor::new().render(&mut surface, &base, &layers)?;
//! ```

use super::effects::render_effect;
use super::pattern::tile_pattern;
use super::position::{is_visible, resolve_position, SurfaceDimensions, TextExtent};
use super::surface::{FontSpec, RasterSurface};
use super::{WatermarkError, WatermarkLayer};
use image::RgbaImage;

/// Summary of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Layers that produced draw calls
    pub layers_drawn: usize,
    /// Layers skipped because their text is empty
    pub layers_skipped: usize,
    /// Pattern tiles stamped across all patterned layers
    pub tiles: usize,
    /// Anchored layers whose run lies entirely outside the surface
    pub offscreen: usize,
}

/// Renders the base image and watermark layers onto a [`RasterSurface`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WatermarkCompositor;

impl WatermarkCompositor {
    pub fn new() -> Self {
        Self
    }

    /// Redraw `surface` from `base` and `layers`.
    ///
    /// The compositor only reads the layers. The surface's graphics state is
    /// the same after the call as before it.
    pub fn render<S: RasterSurface>(
        &self,
        surface: &mut S,
        base: &RgbaImage,
        layers: &[WatermarkLayer],
    ) -> Result<RenderStats, WatermarkError> {
        self.preflight(surface, layers)?;

        surface.clear();
        let (width, height) = (surface.width(), surface.height());
        surface.blit(base, 0.0, 0.0, width as f32, height as f32)?;

        let mut stats = RenderStats::default();
        for layer in layers {
            if layer.is_empty() {
                stats.layers_skipped += 1;
                continue;
            }
            self.render_layer(surface, layer, &mut stats)?;
            stats.layers_drawn += 1;
        }

        tracing::info!(
            width = width,
            height = height,
            layers = stats.layers_drawn,
            skipped = stats.layers_skipped,
            tiles = stats.tiles,
            "Rendered watermark layers"
        );
        Ok(stats)
    }

    /// Check that every layer can be drawn without drawing anything.
    ///
    /// Validates pattern spacing and resolves each layer's font by measuring
    /// its text. Only empty layers are exempt.
    pub fn preflight<S: RasterSurface>(
        &self,
        surface: &mut S,
        layers: &[WatermarkLayer],
    ) -> Result<(), WatermarkError> {
        for layer in layers.iter().filter(|l| !l.is_empty()) {
            if layer.pattern.enabled {
                layer.pattern.step()?;
            }
            let font = FontSpec::new(layer.font.clone(), layer.effective_size_px() as f32);
            surface.measure_text(&layer.text, &font)?;
        }
        Ok(())
    }

    fn render_layer<S: RasterSurface>(
        &self,
        surface: &mut S,
        layer: &WatermarkLayer,
        stats: &mut RenderStats,
    ) -> Result<(), WatermarkError> {
        if layer.opacity != layer.effective_opacity() {
            tracing::warn!(
                layer = %layer.id,
                opacity = layer.opacity,
                clamped = layer.effective_opacity(),
                "Layer opacity out of range, clamping"
            );
        }

        let size_px = layer.effective_size_px() as f32;
        let font = FontSpec::new(layer.font.clone(), size_px);

        surface.with_graphics_state(|s| {
            s.set_global_alpha(layer.effective_opacity());
            s.set_fill_color(layer.color);
            s.set_font(font.clone());
            s.set_composite_operation(layer.blend_mode);

            if layer.pattern.enabled {
                stats.tiles += tile_pattern(
                    s,
                    &layer.text,
                    &layer.pattern,
                    layer.rotation_deg,
                    layer.effect,
                )?;
                return Ok(());
            }

            let metrics = s.measure_text(&layer.text, &font)?;
            let dims = SurfaceDimensions {
                width: s.width(),
                height: s.height(),
            };
            let extent = TextExtent {
                width: metrics.width,
                height: size_px,
            };
            let pos = resolve_position(layer.position, &dims, &extent, layer.custom_x, layer.custom_y);

            if !is_visible(&pos, &dims, &extent) {
                stats.offscreen += 1;
                tracing::debug!(layer = %layer.id, x = pos.x, y = pos.y, "Watermark placed outside the surface");
            }

            tracing::debug!(
                layer = %layer.id,
                x = pos.x,
                y = pos.y,
                width = metrics.width,
                effect = layer.effect.as_str(),
                "Drawing watermark layer"
            );
            render_effect(s, &layer.text, pos.x, pos.y, layer.rotation_deg, layer.effect)
        })
    }
}
