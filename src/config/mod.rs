// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_FALLBACK_FAMILY, DEFAULT_MAX_PIXELS};
use crate::transform::ResizeFilter;
use crate::watermark::{FontBook, LayerDefaults, PresetSetting};

/// Studio configuration loaded from YAML.
///
/// Every section is optional; an empty document yields the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Values given to newly created layers
    #[serde(default)]
    pub defaults: LayerDefaults,
    #[serde(default)]
    pub fonts: FontConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Layers rendered by the command line tool, in paint order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<PresetSetting>,
}

/// Where font faces are loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    /// Load fonts installed on the host (default: true)
    #[serde(default = "default_true")]
    pub load_system_fonts: bool,
    /// Extra directories scanned recursively for font files
    #[serde(default)]
    pub directories: Vec<PathBuf>,
    /// Family tried when a layer's font is not installed (default: sans-serif)
    #[serde(default = "default_fallback_family")]
    pub fallback_family: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            directories: Vec::new(),
            fallback_family: default_fallback_family(),
        }
    }
}

impl FontConfig {
    /// Build a font book from this configuration.
    pub fn font_book(&self) -> FontBook {
        let book = if self.load_system_fonts {
            FontBook::system()
        } else {
            FontBook::empty()
        };
        let mut book = book.with_fallback_family(self.fallback_family.clone());
        for dir in &self.directories {
            book.load_fonts_dir(dir);
        }
        if book.is_empty() {
            tracing::warn!("No font faces loaded; text layers will fail to render");
        }
        book
    }
}

/// Crop/resize settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Resampling filter for resize (default: bilinear)
    #[serde(default)]
    pub resize_filter: ResizeFilter,
    /// Largest resize target in pixels (default: 100,000,000)
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            resize_filter: ResizeFilter::default(),
            max_pixels: default_max_pixels(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (default: info)
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_fallback_family() -> String {
    DEFAULT_FALLBACK_FAMILY.to_string()
}

fn default_max_pixels() -> u64 {
    DEFAULT_MAX_PIXELS
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl StudioConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // Every referenced variable must be set
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty or comment-only document means "all defaults"
        if substituted.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('#')) {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.defaults.validate()?;

        if self.fonts.fallback_family.trim().is_empty() {
            return Err("Font fallback_family cannot be empty".to_string());
        }

        if self.transform.max_pixels == 0 {
            return Err("Transform max_pixels must be greater than 0".to_string());
        }

        // The level may be a full filter directive ("info,watermark_studio=debug");
        // only a bare level is checked here.
        let level = self.logging.level.trim().to_ascii_lowercase();
        if !level.contains(|c| c == '=' || c == ',') && !LOG_LEVELS.contains(&level.as_str()) {
            return Err(format!(
                "Invalid logging level '{}'. Must be one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        for (index, layer) in self.layers.iter().enumerate() {
            if layer.enable_pattern && layer.pattern_spacing <= 0 {
                return Err(format!(
                    "Layer {} ('{}') enables a pattern with non-positive spacing {}",
                    index, layer.name, layer.pattern_spacing
                ));
            }
        }

        Ok(())
    }
}
