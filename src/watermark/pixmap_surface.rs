//! tiny-skia backed raster surface.
//!
//! Text is drawn as glyph outlines (see [`FontBook`]) filled or stroked
//! with anti-aliasing. Shadows are rasterized into a scratch pixmap that
//! covers only the shadowed run, blurred with a separable gaussian and
//! composited under the current blend mode.

use super::fonts::FontBook;
use super::surface::{check_extent, FontSpec, GraphicsState, RasterSurface, StateStack, TextMetrics};
use super::{Color, WatermarkError};
use image::RgbaImage;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Paint, Path, Pixmap, PixmapPaint, PremultipliedColorU8,
    Stroke, Transform,
};

/// Which primitive a text draw uses.
#[derive(Debug, Clone, Copy)]
enum TextPass {
    Fill,
    Stroke,
}

/// Last text outline built, reused while drawing repeated tiles.
struct PathMemo {
    text: String,
    family: String,
    size_bits: u32,
    path: Option<Path>,
}

/// A [`RasterSurface`] that owns an RGBA pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
    states: StateStack,
    fonts: FontBook,
    memo: Option<PathMemo>,
}

impl std::fmt::Debug for PixmapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixmapSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("fonts", &self.fonts)
            .finish()
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, WatermarkError> {
    Pixmap::new(width, height).ok_or_else(|| {
        WatermarkError::InvalidGeometry(format!(
            "surface size must be positive, got {}x{}",
            width, height
        ))
    })
}

impl PixmapSurface {
    /// Create a transparent surface. Zero dimensions fail with `InvalidGeometry`.
    pub fn new(width: u32, height: u32, fonts: FontBook) -> Result<Self, WatermarkError> {
        Ok(Self {
            pixmap: new_pixmap(width, height)?,
            states: StateStack::default(),
            fonts,
            memo: None,
        })
    }

    /// Replace the pixel buffer with a transparent one of the given size.
    ///
    /// The graphics state is reset; fonts are kept.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), WatermarkError> {
        self.pixmap = new_pixmap(width, height)?;
        self.states.reset();
        Ok(())
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        self.memo = None;
        &mut self.fonts
    }

    /// Copy the surface out as straight-alpha RGBA.
    pub fn to_rgba_image(&self) -> Result<RgbaImage, WatermarkError> {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.pixmap.width(), self.pixmap.height(), data).ok_or_else(|| {
            WatermarkError::EncodeFailed("pixel buffer does not match surface size".to_string())
        })
    }

    fn text_path(&mut self, text: &str, font: &FontSpec) -> Result<Option<Path>, WatermarkError> {
        let size_bits = font.size_px.to_bits();
        if let Some(memo) = &self.memo {
            if memo.text == text && memo.family == font.family && memo.size_bits == size_bits {
                return Ok(memo.path.clone());
            }
        }

        let face = self.fonts.resolve(&font.family)?;
        let path = face.text_path(text, font.size_px);
        self.memo = Some(PathMemo {
            text: text.to_string(),
            family: font.family.clone(),
            size_bits,
            path: path.clone(),
        });
        Ok(path)
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, pass: TextPass) -> Result<(), WatermarkError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(WatermarkError::InvalidGeometry(format!(
                "text origin must be finite, got ({}, {})",
                x, y
            )));
        }

        let state = self.states.current().clone();
        let Some(path) = self.text_path(text, &state.font)? else {
            return Ok(());
        };
        let transform = state
            .transform
            .pre_concat(Transform::from_translate(x, y));

        if state.shadow.is_visible() {
            self.draw_shadow(&path, transform, &state, pass);
        }

        let color = match pass {
            TextPass::Fill => state.fill_color,
            TextPass::Stroke => state.stroke_color,
        };
        let paint = solid_paint(color.with_alpha_scaled(state.global_alpha));
        paint_onto(&mut self.pixmap, &path, &paint, transform, &state, pass);
        Ok(())
    }

    fn draw_shadow(&mut self, path: &Path, transform: Transform, state: &GraphicsState, pass: TextPass) {
        let shadow = state.shadow;
        let Some(device_path) = path.clone().transform(transform) else {
            return;
        };
        let bounds = device_path.bounds();

        let sigma = shadow.blur.max(0.0) / 2.0;
        let mut margin = (sigma * 3.0).ceil() + 1.0;
        if let TextPass::Stroke = pass {
            margin += state.line_width;
        }

        let left = (bounds.left() + shadow.offset_x - margin).floor().max(0.0);
        let top = (bounds.top() + shadow.offset_y - margin).floor().max(0.0);
        let right = (bounds.right() + shadow.offset_x + margin)
            .ceil()
            .min(self.pixmap.width() as f32);
        let bottom = (bounds.bottom() + shadow.offset_y + margin)
            .ceil()
            .min(self.pixmap.height() as f32);
        if right <= left || bottom <= top {
            // Shadow lies entirely off-surface
            return;
        }

        let Some(mut scratch) = Pixmap::new((right - left) as u32, (bottom - top) as u32) else {
            return;
        };

        let shadow_paint = solid_paint(shadow.color.with_alpha_scaled(state.global_alpha));
        // Offsets are applied in device space, after the current transform
        let local = Transform::from_translate(shadow.offset_x - left, shadow.offset_y - top)
            .pre_concat(transform);
        let scratch_state = GraphicsState {
            composite: super::BlendMode::Normal,
            ..state.clone()
        };
        paint_onto(&mut scratch, path, &shadow_paint, local, &scratch_state, pass);

        if sigma > 0.0 {
            apply_gaussian_blur(&mut scratch, sigma);
        }

        self.pixmap.draw_pixmap(
            left as i32,
            top as i32,
            scratch.as_ref(),
            &PixmapPaint {
                opacity: 1.0,
                blend_mode: state.composite.into(),
                quality: FilterQuality::Nearest,
            },
            Transform::identity(),
            None,
        );
    }
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.into());
    paint.anti_alias = true;
    paint
}

fn paint_onto(
    target: &mut Pixmap,
    path: &Path,
    paint: &Paint<'_>,
    transform: Transform,
    state: &GraphicsState,
    pass: TextPass,
) {
    let mut paint = paint.clone();
    paint.blend_mode = state.composite.into();
    match pass {
        TextPass::Fill => target.fill_path(path, &paint, FillRule::Winding, transform, None),
        TextPass::Stroke => {
            let stroke = Stroke {
                width: state.line_width,
                ..Stroke::default()
            };
            target.stroke_path(path, &paint, &stroke, transform, None);
        }
    }
}

impl RasterSurface for PixmapSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn blit(&mut self, image: &RgbaImage, x: f32, y: f32, w: f32, h: f32) -> Result<(), WatermarkError> {
        check_extent(w, h)?;
        let source = pixmap_from_rgba(image)?;
        let state = self.states.current();

        let transform = state
            .transform
            .pre_concat(Transform::from_translate(x, y))
            .pre_concat(Transform::from_scale(
                w / image.width() as f32,
                h / image.height() as f32,
            ));
        let paint = PixmapPaint {
            opacity: state.global_alpha,
            blend_mode: state.composite.into(),
            quality: FilterQuality::Bilinear,
        };

        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
        Ok(())
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> Result<TextMetrics, WatermarkError> {
        let face = self.fonts.resolve(&font.family)?;
        Ok(TextMetrics {
            width: face.advance_width(text, font.size_px),
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
        self.draw_text(text, x, y, TextPass::Fill)
    }

    fn stroke_text(&mut self, text: &str, x: f32, y: f32) -> Result<(), WatermarkError> {
        self.draw_text(text, x, y, TextPass::Stroke)
    }
}

/// Convert a straight-alpha RGBA image into a premultiplied pixmap.
pub(crate) fn pixmap_from_rgba(image: &RgbaImage) -> Result<Pixmap, WatermarkError> {
    let mut pixmap = new_pixmap(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

fn gaussian_kernel(sigma: f32) -> (Vec<f32>, usize) {
    let radius = (sigma.abs() * 3.0).ceil() as usize;
    if radius == 0 {
        return (Vec::new(), 0);
    }

    let sigma_sq = sigma * sigma;
    let mut kernel: Vec<f32> = (0..=radius * 2)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / (2.0 * sigma_sq)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    if sum != 0.0 {
        for k in &mut kernel {
            *k /= sum;
        }
    }
    (kernel, radius)
}

/// Separable gaussian blur over premultiplied pixels, clamping at the edges.
fn apply_gaussian_blur(pixmap: &mut Pixmap, sigma: f32) {
    let (kernel, radius) = gaussian_kernel(sigma);
    if kernel.is_empty() {
        return;
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let src: Vec<[f32; 4]> = pixmap
        .pixels()
        .iter()
        .map(|p| {
            [
                p.red() as f32,
                p.green() as f32,
                p.blue() as f32,
                p.alpha() as f32,
            ]
        })
        .collect();

    let blur_pass = |input: &[[f32; 4]], horizontal: bool| -> Vec<[f32; 4]> {
        let mut out = vec![[0.0f32; 4]; input.len()];
        for y in 0..height {
            for x in 0..width {
                let mut accum = [0.0f32; 4];
                for (i, weight) in kernel.iter().enumerate() {
                    let offset = i as isize - radius as isize;
                    let idx = if horizontal {
                        let cx = (x as isize + offset).clamp(0, width as isize - 1) as usize;
                        y * width + cx
                    } else {
                        let cy = (y as isize + offset).clamp(0, height as isize - 1) as usize;
                        cy * width + x
                    };
                    let sample = input[idx];
                    for c in 0..4 {
                        accum[c] += sample[c] * weight;
                    }
                }
                out[y * width + x] = accum;
            }
        }
        out
    };

    let temp = blur_pass(&src, true);
    let dst = blur_pass(&temp, false);

    for (px, vals) in pixmap.pixels_mut().iter_mut().zip(dst.iter()) {
        let a = vals[3].round().clamp(0.0, 255.0) as u8;
        // Keep color channels within alpha so the result stays premultiplied
        let channel = |v: f32| v.round().clamp(0.0, a as f32) as u8;
        *px = PremultipliedColorU8::from_rgba(channel(vals[0]), channel(vals[1]), channel(vals[2]), a)
            .unwrap_or(PremultipliedColorU8::TRANSPARENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::Shadow;
    use image::Rgba;

    fn surface(w: u32, h: u32) -> PixmapSurface {
        PixmapSurface::new(w, h, FontBook::empty()).unwrap()
    }

    #[test]
    fn test_zero_size_is_invalid_geometry() {
        assert!(matches!(
            PixmapSurface::new(0, 10, FontBook::empty()),
            Err(WatermarkError::InvalidGeometry(_))
        ));
        let mut s = surface(4, 4);
        assert!(s.resize(4, 0).is_err());
        assert_eq!(s.width(), 4);
    }

    #[test]
    fn test_blit_scales_to_target_rect() {
        let mut s = surface(8, 8);
        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        s.blit(&red, 0.0, 0.0, 8.0, 8.0).unwrap();

        let out = s.to_rgba_image().unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(7, 7), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_blit_rejects_bad_extent() {
        let mut s = surface(8, 8);
        let img = RgbaImage::new(2, 2);
        assert!(matches!(
            s.blit(&img, 0.0, 0.0, 0.0, 8.0),
            Err(WatermarkError::InvalidGeometry(_))
        ));
        assert!(s.blit(&img, 0.0, 0.0, f32::INFINITY, 8.0).is_err());
    }

    #[test]
    fn test_clear_erases_pixels() {
        let mut s = surface(4, 4);
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        s.blit(&img, 0.0, 0.0, 4.0, 4.0).unwrap();
        s.clear();
        let out = s.to_rgba_image().unwrap();
        assert!(out.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_text_without_fonts_is_font_unavailable() {
        let mut s = surface(16, 16);
        assert!(matches!(
            s.fill_text("hi", 0.0, 10.0),
            Err(WatermarkError::FontUnavailable(_))
        ));
    }

    #[test]
    fn test_fill_text_with_system_font_changes_pixels() {
        let fonts = FontBook::system();
        if fonts.is_empty() {
            return;
        }
        let mut s = PixmapSurface::new(200, 80, fonts).unwrap();
        s.set_font(FontSpec::new("sans-serif", 40.0));
        s.set_fill_color(Color::black());
        s.set_shadow(Shadow::new(Color::rgba(0, 0, 0, 128), 4.0, (3.0, 3.0)));
        s.fill_text("Mark", 10.0, 50.0).unwrap();

        let out = s.to_rgba_image().unwrap();
        assert!(out.pixels().any(|p| p.0[3] > 0));
    }

    #[test]
    fn test_gaussian_blur_spreads_and_preserves_mass() {
        let mut pm = Pixmap::new(9, 9).unwrap();
        let idx = 4 * 9 + 4;
        pm.pixels_mut()[idx] = ColorU8::from_rgba(0, 0, 0, 255).premultiply();
        apply_gaussian_blur(&mut pm, 1.0);

        let center = pm.pixels()[idx].alpha();
        let neighbour = pm.pixels()[idx + 1].alpha();
        assert!(center < 255);
        assert!(neighbour > 0);
        let total: u32 = pm.pixels().iter().map(|p| p.alpha() as u32).sum();
        assert!((200..=300).contains(&total));
    }

    #[test]
    fn test_pixmap_round_trip_keeps_straight_alpha() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([200, 100, 50, 255]));
        let pm = pixmap_from_rgba(&img).unwrap();
        assert_eq!(pm.pixels()[0].demultiply(), ColorU8::from_rgba(200, 100, 50, 255));
    }
}
