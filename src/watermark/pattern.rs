//! Repeating-grid watermark tiling.
//!
//! A patterned layer ignores its anchor and stamps its text on a regular
//! grid. The grid covers the 3x3 super-area centred on the surface,
//! `[-width, 2*width) x [-height, 2*height)`, so no gaps appear once the
//! grid rotation moves tile origins off-surface.

use super::effects::render_effect;
use super::surface::RasterSurface;
use super::{PatternSettings, TextEffect, WatermarkError};

/// Lazily walk the tile grid: the outer loop walks x, the inner loop walks y.
fn grid(width: u32, height: u32, step: usize) -> impl Iterator<Item = (i32, i32)> {
    let (w, h) = (width as i64, height as i64);
    let rows = (-h..2 * h).step_by(step);
    (-w..2 * w)
        .step_by(step)
        .flat_map(move |i| rows.clone().map(move |j| (i as i32, j as i32)))
}

/// Tile origins for a `width` x `height` surface at the given spacing.
///
/// Origins are produced column by column: the outer loop walks x, the inner
/// loop walks y. Fails with `InvalidPattern` when `spacing` is not positive.
/// Drawing walks the same grid without collecting it.
pub fn tile_origins(width: u32, height: u32, spacing: i32) -> Result<Vec<(i32, i32)>, WatermarkError> {
    let step = PatternSettings::tiled(spacing, 0).step()? as usize;
    Ok(grid(width, height, step).collect())
}

/// Stamp `text` at every tile origin and return the number of tiles drawn.
///
/// Each tile is drawn in its own graphics state: translate to the origin,
/// rotate by the pattern angle, then render the effect at the local origin
/// with the glyph rotation.
pub fn tile_pattern<S: RasterSurface>(
    surface: &mut S,
    text: &str,
    pattern: &PatternSettings,
    rotation_deg: i32,
    effect: TextEffect,
) -> Result<usize, WatermarkError> {
    let step = pattern.step()? as usize;
    let angle = (pattern.angle_deg as f32).to_radians();

    let mut tiles = 0;
    for (i, j) in grid(surface.width(), surface.height(), step) {
        surface.with_graphics_state(|s| {
            s.translate(i as f32, j as f32);
            s.rotate(angle);
            render_effect(s, text, 0.0, 0.0, rotation_deg, effect)
        })?;
        tiles += 1;
    }

    tracing::debug!(
        tiles = tiles,
        spacing = pattern.spacing,
        angle = pattern.angle_deg,
        "Tiled watermark pattern"
    );
    Ok(tiles)
}
