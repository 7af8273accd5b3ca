// Error types module

use crate::watermark::WatermarkError;
use thiserror::Error;

/// Top-level error for the studio and the command line tool.
///
/// Core rendering and transform failures keep their precise
/// [`WatermarkError`] variant; configuration and I/O problems are reported
/// separately so they can be told apart at the edge.
#[derive(Debug, Error)]
pub enum StudioError {
    /// Configuration errors (invalid YAML, missing env vars, failed validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading input or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering, transform or codec failure
    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    /// A requested preset is not in the loaded library
    #[error("Unknown preset '{0}'")]
    UnknownPreset(String),
}
