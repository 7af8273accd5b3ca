//! Text effect rendering.
//!
//! Every effect draws inside its own graphics state: translate to the draw
//! origin, rotate by the glyph rotation, then issue the effect's passes.
//! Each effect ends with a fill in the layer's fill color, so a glyph run is
//! always filled at least once.
//!
//! | Effect  | Passes |
//! |---------|--------|
//! | None    | fill |
//! | Outline | white stroke (width 3), fill |
//! | Shadow  | fill with a soft drop shadow |
//! | Emboss  | fill with a light highlight, fill with a dark shade |
//! | Neon    | stroke (width 2) and fill, both glowing in the fill color |

use super::surface::{RasterSurface, Shadow};
use super::{TextEffect, WatermarkError};
use crate::constants::{
    EMBOSS_BLUR, EMBOSS_HIGHLIGHT_COLOR, EMBOSS_HIGHLIGHT_OFFSET, EMBOSS_SHADE_COLOR,
    EMBOSS_SHADE_OFFSET, NEON_BLUR, NEON_STROKE_WIDTH, OUTLINE_COLOR, OUTLINE_STROKE_WIDTH,
    SHADOW_BLUR, SHADOW_COLOR, SHADOW_OFFSET,
};

/// Draw `text` at `(x, y)` rotated by `rotation_deg` with the given effect.
///
/// Uses the surface's current fill color, font, alpha and composite mode.
/// The graphics state is restored before returning.
pub fn render_effect<S: RasterSurface>(
    surface: &mut S,
    text: &str,
    x: f32,
    y: f32,
    rotation_deg: i32,
    effect: TextEffect,
) -> Result<(), WatermarkError> {
    surface.with_graphics_state(|s| {
        s.translate(x, y);
        s.rotate((rotation_deg as f32).to_radians());

        match effect {
            TextEffect::None => s.fill_text(text, 0.0, 0.0),
            TextEffect::Outline => {
                s.set_stroke_style(OUTLINE_COLOR, OUTLINE_STROKE_WIDTH);
                s.stroke_text(text, 0.0, 0.0)?;
                s.fill_text(text, 0.0, 0.0)
            }
            TextEffect::Shadow => {
                s.set_shadow(Shadow::new(SHADOW_COLOR, SHADOW_BLUR, SHADOW_OFFSET));
                s.fill_text(text, 0.0, 0.0)
            }
            TextEffect::Emboss => {
                s.set_shadow(Shadow::new(
                    EMBOSS_HIGHLIGHT_COLOR,
                    EMBOSS_BLUR,
                    EMBOSS_HIGHLIGHT_OFFSET,
                ));
                s.fill_text(text, 0.0, 0.0)?;
                // The dark shade is rendered by the closing fill
                s.set_shadow(Shadow::new(EMBOSS_SHADE_COLOR, EMBOSS_BLUR, EMBOSS_SHADE_OFFSET));
                s.fill_text(text, 0.0, 0.0)
            }
            TextEffect::Neon => {
                let glow = s.fill_color();
                s.set_shadow(Shadow::new(glow, NEON_BLUR, (0.0, 0.0)));
                s.set_stroke_style(glow, NEON_STROKE_WIDTH);
                s.stroke_text(text, 0.0, 0.0)?;
                s.fill_text(text, 0.0, 0.0)
            }
        }
    })
}
