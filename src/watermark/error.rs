//! Watermark error types.
//!
//! Defines errors that can occur while compositing watermarks or
//! transforming the base image.

use std::fmt;

/// Errors that can occur during watermark rendering and image transforms.
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkError {
    /// Surface or rectangle dimensions are non-positive or not finite
    InvalidGeometry(String),

    /// Resize target dimensions are non-positive, not finite or too large
    InvalidDimensions(String),

    /// Crop selection has zero width or height
    EmptySelection,

    /// Pattern spacing is not a positive integer
    InvalidPattern(String),

    /// A referenced layer does not exist in the layer set
    MissingLayerData(String),

    /// A layer with the same id is already in the layer set
    DuplicateLayer(String),

    /// A color string could not be parsed
    InvalidColor(String),

    /// A preset record or preset list could not be read or written
    InvalidPreset(String),

    /// Failed to decode the base image
    DecodeFailed(String),

    /// Failed to encode the rendered surface
    EncodeFailed(String),

    /// No usable font face could be resolved
    FontUnavailable(String),

    /// An operation needed a base image before one was loaded
    NoImageLoaded,
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGeometry(msg) => write!(f, "Invalid geometry: {}", msg),
            Self::InvalidDimensions(msg) => write!(f, "Invalid resize dimensions: {}", msg),
            Self::EmptySelection => write!(f, "Crop selection is empty"),
            Self::InvalidPattern(msg) => write!(f, "Invalid pattern settings: {}", msg),
            Self::MissingLayerData(id) => write!(f, "No watermark layer with id '{}'", id),
            Self::DuplicateLayer(id) => write!(f, "Layer id '{}' is already in use", id),
            Self::InvalidColor(msg) => write!(f, "Invalid color: {}", msg),
            Self::InvalidPreset(msg) => write!(f, "Invalid preset: {}", msg),
            Self::DecodeFailed(msg) => write!(f, "Failed to decode image: {}", msg),
            Self::EncodeFailed(msg) => write!(f, "Failed to encode image: {}", msg),
            Self::FontUnavailable(family) => write!(f, "No font available for '{}'", family),
            Self::NoImageLoaded => write!(f, "No base image loaded"),
        }
    }
}

impl std::error::Error for WatermarkError {}
