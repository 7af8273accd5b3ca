//! Raster surface abstraction.
//!
//! [`RasterSurface`] is the drawing contract the compositor, tiler and
//! effect renderer are written against: a 2D canvas with a stack of
//! graphics states (transform, alpha, colors, font, shadow, composite
//! mode) and text fill/stroke primitives.
//!
//! Two implementations ship with the crate:
//! - [`PixmapSurface`](super::PixmapSurface) rasterizes into a tiny-skia pixmap
//! - [`RecordingSurface`](super::RecordingSurface) records draw calls

use super::{BlendMode, Color, WatermarkError};
use image::RgbaImage;
use tiny_skia::Transform;

/// Font selection: logical family plus size in pixels (em size).
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size_px: f32,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size_px: f32) -> Self {
        Self {
            family: family.into(),
            size_px,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_FONT_FAMILY, 10.0)
    }
}

/// Measured extents of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    /// Advance width of the run in pixels
    pub width: f32,
}

/// Shadow applied to subsequent fill and stroke operations.
///
/// Offsets are in device pixels and are not affected by the current
/// transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Shadow {
    pub fn new(color: Color, blur: f32, offset: (f32, f32)) -> Self {
        Self {
            color,
            blur,
            offset_x: offset.0,
            offset_y: offset.1,
        }
    }

    /// No shadow.
    pub fn none() -> Self {
        Self::new(Color::transparent(), 0.0, (0.0, 0.0))
    }

    /// True when drawing this shadow would produce visible pixels.
    pub fn is_visible(&self) -> bool {
        self.color.a > 0 && (self.blur > 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0)
    }
}

impl Default for Shadow {
    fn default() -> Self {
        Self::none()
    }
}

/// The mutable drawing state that `save`/`restore` snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub transform: Transform,
    pub global_alpha: f32,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub line_width: f32,
    pub font: FontSpec,
    pub composite: BlendMode,
    pub shadow: Shadow,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            global_alpha: 1.0,
            fill_color: Color::black(),
            stroke_color: Color::black(),
            line_width: 1.0,
            font: FontSpec::default(),
            composite: BlendMode::Normal,
            shadow: Shadow::none(),
        }
    }
}

/// Current graphics state plus the saved states below it.
#[derive(Debug, Clone, Default)]
pub struct StateStack {
    current: GraphicsState,
    saved: Vec<GraphicsState>,
}

impl StateStack {
    pub fn current(&self) -> &GraphicsState {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut GraphicsState {
        &mut self.current
    }

    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Pop the most recent saved state. Restoring with nothing saved is a no-op.
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.current = state;
        }
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Drop every saved state and return to the initial state.
    pub fn reset(&mut self) {
        self.saved.clear();
        self.current = GraphicsState::default();
    }
}

/// A mutable 2D raster target with canvas-style drawing primitives.
pub trait RasterSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Erase every pixel to transparent. Graphics state is left untouched.
    fn clear(&mut self);

    /// Draw `image` scaled into the rectangle `(x, y, w, h)` under the
    /// current transform.
    fn blit(&mut self, image: &RgbaImage, x: f32, y: f32, w: f32, h: f32)
        -> Result<(), WatermarkError>;

    /// Advance width of `text` set in `font`.
    fn measure_text(&mut self, text: &str, font: &FontSpec) -> Result<TextMetrics, WatermarkError>;

    fn state(&self) -> &GraphicsState;

    fn state_mut(&mut self) -> &mut GraphicsState;

    /// Push a copy of the current graphics state.
    fn save(&mut self);

    /// Pop back to the most recently saved graphics state.
    fn restore(&mut self);

    /// Fill `text` with its baseline origin at `(x, y)` in local coordinates.
    fn fill_text(&mut self, text: &str, x: f32, y: f32) -> Result<(), WatermarkError>;

    /// Stroke the outline of `text` with the current stroke color and width.
    fn stroke_text(&mut self, text: &str, x: f32, y: f32) -> Result<(), WatermarkError>;

    fn translate(&mut self, dx: f32, dy: f32) {
        let state = self.state_mut();
        state.transform = state
            .transform
            .pre_concat(Transform::from_translate(dx, dy));
    }

    fn rotate(&mut self, radians: f32) {
        let state = self.state_mut();
        state.transform = state
            .transform
            .pre_concat(Transform::from_rotate(radians.to_degrees()));
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        // Out-of-range values are ignored, as on an HTML canvas
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.state_mut().global_alpha = alpha;
        }
    }

    fn set_fill_color(&mut self, color: Color) {
        self.state_mut().fill_color = color;
    }

    fn fill_color(&self) -> Color {
        self.state().fill_color
    }

    fn set_stroke_style(&mut self, color: Color, width: f32) {
        let state = self.state_mut();
        state.stroke_color = color;
        if width.is_finite() && width > 0.0 {
            state.line_width = width;
        }
    }

    fn set_font(&mut self, font: FontSpec) {
        self.state_mut().font = font;
    }

    fn set_composite_operation(&mut self, mode: BlendMode) {
        self.state_mut().composite = mode;
    }

    fn set_shadow(&mut self, shadow: Shadow) {
        self.state_mut().shadow = shadow;
    }

    /// Run `f` between `save` and `restore`.
    ///
    /// The state is restored whether `f` succeeds or returns an error.
    fn with_graphics_state<R, F>(&mut self, f: F) -> Result<R, WatermarkError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<R, WatermarkError>,
    {
        self.save();
        let result = f(self);
        self.restore();
        result
    }
}

/// Reject non-finite or non-positive draw dimensions.
pub(crate) fn check_extent(w: f32, h: f32) -> Result<(), WatermarkError> {
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(WatermarkError::InvalidGeometry(format!(
            "draw size must be positive and finite, got {}x{}",
            w, h
        )));
    }
    Ok(())
}
