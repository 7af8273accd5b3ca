//! Base image transforms: crop and resize.
//!
//! Both operations are pure: they read a [`BaseImage`] and return a new one,
//! leaving the input untouched. Callers swap the result in only when the
//! whole operation succeeded.
//!
//! Crop selections arrive in *displayed* pixel space (the element showing
//! the surface may be scaled relative to its backing buffer) and are mapped
//! into image space before cutting.

pub mod codec;

use crate::watermark::WatermarkError;
use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::{imageops, DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::ops::Deref;
use std::sync::Arc;

pub use codec::{decode_image, decode_image_async, encode_png, parse_data_uri, png_data_uri, to_data_uri};

/// The current source bitmap. Cheap to clone; never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseImage(Arc<RgbaImage>);

impl BaseImage {
    pub fn new(image: RgbaImage) -> Result<Self, WatermarkError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(WatermarkError::InvalidGeometry(format!(
                "image must not be empty, got {}x{}",
                image.width(),
                image.height()
            )));
        }
        Ok(Self(Arc::new(image)))
    }

    pub fn from_dynamic(image: DynamicImage) -> Result<Self, WatermarkError> {
        Self::new(image.to_rgba8())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.0
    }
}

impl Deref for BaseImage {
    type Target = RgbaImage;

    fn deref(&self) -> &RgbaImage {
        &self.0
    }
}

/// Resampling filter used by [`resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Bilinear,
    Lanczos3,
}

impl ResizeFilter {
    /// Filters that mix neighbouring pixels need premultiplied alpha.
    fn blends_pixels(self) -> bool {
        !matches!(self, Self::Nearest)
    }

    fn algorithm(self) -> ResizeAlg {
        match self {
            Self::Nearest => ResizeAlg::Nearest,
            Self::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
            Self::Lanczos3 => ResizeAlg::Convolution(FilterType::Lanczos3),
        }
    }
}

fn target_dimension(name: &str, value: f64) -> Result<NonZeroU32, WatermarkError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(WatermarkError::InvalidDimensions(format!(
            "{} must be a positive number, got {}",
            name, value
        )));
    }
    let rounded = value.round();
    if rounded > u32::MAX as f64 {
        return Err(WatermarkError::InvalidDimensions(format!(
            "{} {} is too large",
            name, value
        )));
    }
    NonZeroU32::new(rounded as u32).ok_or_else(|| {
        WatermarkError::InvalidDimensions(format!("{} {} rounds to zero", name, value))
    })
}

/// Scale the whole image to `width` x `height`.
///
/// Fractional targets are rounded to whole pixels. Fails with
/// `InvalidDimensions` for non-positive or non-finite targets and for
/// targets above `max_pixels` pixels.
pub fn resize(
    base: &BaseImage,
    width: f64,
    height: f64,
    filter: ResizeFilter,
    max_pixels: u64,
) -> Result<BaseImage, WatermarkError> {
    let dst_width = target_dimension("width", width)?;
    let dst_height = target_dimension("height", height)?;

    let pixels = dst_width.get() as u64 * dst_height.get() as u64;
    if pixels > max_pixels {
        return Err(WatermarkError::InvalidDimensions(format!(
            "{}x{} exceeds the limit of {} pixels",
            dst_width, dst_height, max_pixels
        )));
    }

    let (src_w, src_h) = base.dimensions();
    if (src_w, src_h) == (dst_width.get(), dst_height.get()) {
        return Ok(base.clone());
    }

    let src_width = NonZeroU32::new(src_w)
        .ok_or_else(|| WatermarkError::InvalidGeometry("source width is 0".to_string()))?;
    let src_height = NonZeroU32::new(src_h)
        .ok_or_else(|| WatermarkError::InvalidGeometry("source height is 0".to_string()))?;

    let mut src_image = Image::from_vec_u8(
        src_width,
        src_height,
        base.as_rgba().as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| WatermarkError::InvalidGeometry(format!("failed to wrap source image: {:?}", e)))?;

    // Transparent pixels must not bleed their color into the result
    let mul_div = MulDiv::default();
    if filter.blends_pixels() {
        mul_div
            .multiply_alpha_inplace(&mut src_image.view_mut())
            .map_err(|e| WatermarkError::InvalidGeometry(format!("failed to premultiply alpha: {:?}", e)))?;
    }

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut dst_view = dst_image.view_mut();
    let mut resizer = Resizer::new(filter.algorithm());
    resizer
        .resize(&src_image.view(), &mut dst_view)
        .map_err(|e| WatermarkError::InvalidDimensions(format!("resize failed: {:?}", e)))?;

    if filter.blends_pixels() {
        mul_div
            .divide_alpha_inplace(&mut dst_view)
            .map_err(|e| WatermarkError::InvalidGeometry(format!("failed to restore alpha: {:?}", e)))?;
    }

    let rgba = RgbaImage::from_raw(dst_width.get(), dst_height.get(), dst_image.into_vec())
        .ok_or_else(|| {
            WatermarkError::InvalidDimensions("resized buffer does not match target size".to_string())
        })?;

    tracing::info!(
        from_width = src_w,
        from_height = src_h,
        to_width = dst_width.get(),
        to_height = dst_height.get(),
        filter = ?filter,
        "Resized base image"
    );
    BaseImage::new(rgba)
}

/// Axis-aligned rectangle in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A crop drag in displayed pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSelection {
    /// Where the drag started
    pub start: (f64, f64),
    /// Where the drag ended; may be above or left of `start`
    pub end: (f64, f64),
    /// Size the surface was displayed at. `None` means unscaled.
    pub displayed: Option<(f64, f64)>,
}

impl CropSelection {
    /// A selection made on a surface displayed at its backing size.
    pub fn new(start: (f64, f64), end: (f64, f64)) -> Self {
        Self {
            start,
            end,
            displayed: None,
        }
    }

    /// A selection made on a surface displayed at `width` x `height`.
    pub fn displayed_at(mut self, width: f64, height: f64) -> Self {
        self.displayed = Some((width, height));
        self
    }

    /// Map the selection into the pixel space of a `width` x `height` surface.
    ///
    /// The drag is normalised, scaled by surface/displayed size, rounded to
    /// whole pixels and clamped to the surface.
    pub fn to_image_rect(&self, width: u32, height: u32) -> Result<ImageRect, WatermarkError> {
        let (dw, dh) = self.displayed.unwrap_or((width as f64, height as f64));
        if !dw.is_finite() || !dh.is_finite() || dw <= 0.0 || dh <= 0.0 {
            return Err(WatermarkError::InvalidGeometry(format!(
                "displayed size must be positive, got {}x{}",
                dw, dh
            )));
        }
        let coords = [self.start.0, self.start.1, self.end.0, self.end.1];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(WatermarkError::InvalidGeometry(
                "selection points must be finite".to_string(),
            ));
        }

        let scale_x = width as f64 / dw;
        let scale_y = height as f64 / dh;
        let map = |a: f64, b: f64, scale: f64, limit: u32| -> (u32, u32) {
            let lo = (a.min(b) * scale).round().clamp(0.0, limit as f64) as u32;
            let hi = (a.max(b) * scale).round().clamp(0.0, limit as f64) as u32;
            (lo, hi)
        };

        let (left, right) = map(self.start.0, self.end.0, scale_x, width);
        let (top, bottom) = map(self.start.1, self.end.1, scale_y, height);
        if right == left || bottom == top {
            return Err(WatermarkError::EmptySelection);
        }

        Ok(ImageRect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        })
    }
}

/// Cut the selected region out of `base`.
///
/// The selection is interpreted against the image's own dimensions, which
/// are also the surface dimensions it is rendered at.
pub fn crop(base: &BaseImage, selection: &CropSelection) -> Result<BaseImage, WatermarkError> {
    let (width, height) = base.dimensions();
    let rect = selection.to_image_rect(width, height)?;

    let cropped = imageops::crop_imm(base.as_rgba(), rect.x, rect.y, rect.width, rect.height).to_image();
    tracing::info!(
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        "Cropped base image"
    );
    BaseImage::new(cropped)
}
