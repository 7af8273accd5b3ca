//! Decoding, PNG encoding and data-URI helpers.
//!
//! Decoding is CPU-bound; [`decode_image_async`] runs it on tokio's blocking
//! pool so callers on the runtime never stall while a large image decodes.

use super::BaseImage;
use crate::watermark::WatermarkError;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::png::PngEncoder;
use image::io::Reader as ImageReader;
use image::{ImageEncoder, RgbaImage};
use std::io::Cursor;

/// Decode encoded image bytes (PNG, JPEG, WebP, GIF) into a base image.
pub fn decode_image(data: &[u8]) -> Result<BaseImage, WatermarkError> {
    let image = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| WatermarkError::DecodeFailed(e.to_string()))?
        .decode()
        .map_err(|e| WatermarkError::DecodeFailed(e.to_string()))?;

    BaseImage::from_dynamic(image).map_err(|e| WatermarkError::DecodeFailed(e.to_string()))
}

/// Decode on the blocking thread pool.
pub async fn decode_image_async(data: Vec<u8>) -> Result<BaseImage, WatermarkError> {
    tokio::task::spawn_blocking(move || decode_image(&data))
        .await
        .map_err(|e| WatermarkError::DecodeFailed(format!("decode task failed: {}", e)))?
}

/// Encode straight-alpha RGBA pixels as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, WatermarkError> {
    let mut output = Cursor::new(Vec::new());
    PngEncoder::new(&mut output)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| WatermarkError::EncodeFailed(e.to_string()))?;
    Ok(output.into_inner())
}

/// Build a base64 `data:` URI.
pub fn to_data_uri(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

/// Encode `image` as PNG and wrap it in a data URI.
pub fn png_data_uri(image: &RgbaImage) -> Result<String, WatermarkError> {
    Ok(to_data_uri("image/png", &encode_png(image)?))
}

/// Split a base64 `data:` URI into its media type and decoded bytes.
pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>), WatermarkError> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| WatermarkError::DecodeFailed("not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| WatermarkError::DecodeFailed("data URI has no payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| WatermarkError::DecodeFailed("only base64 data URIs are supported".to_string()))?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| WatermarkError::DecodeFailed(format!("invalid base64 payload: {}", e)))?;
    Ok((mime.to_string(), bytes))
}
