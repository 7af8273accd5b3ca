//! A surface that records draw calls instead of rasterizing them.
//!
//! Useful for layout inspection and dry runs: the recorded calls carry the
//! fully resolved device-space origin, color, alpha, shadow and blend mode
//! of every text draw. Text is measured with a fixed advance per character,
//! so results do not depend on installed fonts.

use super::surface::{check_extent, FontSpec, GraphicsState, RasterSurface, StateStack, TextMetrics};
use super::{BlendMode, Color, Shadow, WatermarkError};
use image::RgbaImage;

/// Advance of one character as a fraction of the font size.
pub const DEFAULT_ADVANCE_RATIO: f32 = 0.5;

/// One recorded text draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub text: String,
    /// Local origin passed by the caller
    pub local: (f32, f32),
    /// Origin mapped through the transform current at draw time
    pub device: (f32, f32),
    pub color: Color,
    pub global_alpha: f32,
    pub font: FontSpec,
    pub line_width: f32,
    pub shadow: Shadow,
    pub composite: BlendMode,
}

/// One recorded surface operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear,
    Blit {
        width: u32,
        height: u32,
        rect: (f32, f32, f32, f32),
    },
    FillText(TextDraw),
    StrokeText(TextDraw),
}

/// [`RasterSurface`] implementation that keeps a log of draw calls.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    advance_ratio: f32,
    states: StateStack,
    calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, WatermarkError> {
        if width == 0 || height == 0 {
            return Err(WatermarkError::InvalidGeometry(format!(
                "surface size must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            advance_ratio: DEFAULT_ADVANCE_RATIO,
            states: StateStack::default(),
            calls: Vec::new(),
        })
    }

    pub fn with_advance_ratio(mut self, ratio: f32) -> Self {
        self.advance_ratio = ratio;
        self
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Recorded text draws (fills and strokes) in order.
    pub fn text_draws(&self) -> impl Iterator<Item = &TextDraw> {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::FillText(draw) | DrawCall::StrokeText(draw) => Some(draw),
            _ => None,
        })
    }

    pub fn fill_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::FillText(_)))
            .count()
    }

    pub fn stroke_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::StrokeText(_)))
            .count()
    }

    /// Graphics states currently saved (0 when every save was restored).
    pub fn saved_depth(&self) -> usize {
        self.states.depth()
    }

    fn record_text(&self, text: &str, x: f32, y: f32, stroke: bool) -> Result<TextDraw, WatermarkError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(WatermarkError::InvalidGeometry(format!(
                "text origin must be finite, got ({}, {})",
                x, y
            )));
        }
        let state = self.states.current();
        let mut point = [tiny_skia::Point::from_xy(x, y)];
        state.transform.map_points(&mut point);

        Ok(TextDraw {
            text: text.to_string(),
            local: (x, y),
            device: (point[0].x, point[0].y),
            color: if stroke {
                state.stroke_color
            } else {
                state.fill_color
            },
            global_alpha: state.global_alpha,
            font: state.font.clone(),
            line_width: state.line_width,
            shadow: state.shadow,
            composite: state.composite,
        })
    }
}

impl RasterSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn blit(&mut self, image: &RgbaImage, x: f32, y: f32, w: f32, h: f32) -> Result<(), WatermarkError> {
        check_extent(w, h)?;
        self.calls.push(DrawCall::Blit {
            width: image.width(),
            height: image.height(),
            rect: (x, y, w, h),
        });
        Ok(())
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> Result<TextMetrics, WatermarkError> {
        Ok(TextMetrics {
            width: text.chars().count() as f32 * font.size_px * self.advance_ratio,
        })
    }

    fn state(&self) -> &GraphicsState {
        self.states.current()
    }

    fn state_mut(&mut self) -> &mut GraphicsState {
        self.states.current_mut()
    }

    fn save(&mut self) {
        self.states.save();
    }

    fn restore(&mut self) {
        self.states.restore();
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) -> Result<(), WatermarkError> {
        let draw = self.record_text(text, x, y, false)?;
        self.calls.push(DrawCall::FillText(draw));
        Ok(())
    }

    fn stroke_text(&mut self, text: &str, x: f32, y: f32) -> Result<(), WatermarkError> {
        let draw = self.record_text(text, x, y, true)?;
        self.calls.push(DrawCall::StrokeText(draw));
        Ok(())
    }
}
