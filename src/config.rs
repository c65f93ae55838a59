//! Configuration types for the extraction pipeline.
//!
//! Loaded from a JSON file. Every field has a default, so a partial file (or
//! no file at all) yields a usable configuration. The loaded value is passed
//! explicitly to whatever needs it; there is no process-wide instance.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Image normalization settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Output width in pixels; height follows the source aspect ratio
    pub target_width: u32,
    /// Gaussian sigma of the unsharp mask
    pub sharpen_sigma: f32,
    /// Minimum brightness difference the unsharp mask will amplify
    pub sharpen_threshold: i32,
    /// Upper bound on decoded and resized pixel counts
    pub max_pixels: u64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_width: 1500,
            sharpen_sigma: 1.0,
            sharpen_threshold: 2,
            max_pixels: 40_000_000,
        }
    }
}

/// OCR engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language code
    pub language: String,
    /// Tesseract page segmentation mode
    pub psm: u8,
    /// Explicit path to the tesseract executable
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            psm: 6, // Assume single uniform block of text
            tesseract_path: None,
            tessdata_dir: None,
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub preprocess: PreprocessConfig,
    pub ocr: OcrConfig,
    /// History file; defaults to `<data dir>/history.jsonl`
    pub history_path: Option<PathBuf>,
}

impl AppConfig {
    /// Reads configuration from `path`, failing if it is missing or invalid.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let contents = fs::read_to_string(path).map_err(|e| PipelineError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        serde_json::from_str(&contents).map_err(|e| PipelineError::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })
    }

    /// Reads configuration from `path` if present, otherwise returns defaults.
    /// Unreadable or malformed files are logged and ignored.
    pub fn load_or_default(path: &Path) -> Self {
        log::debug!("Looking for config at: {}", path.display());

        if !path.exists() {
            log::info!("{} not found. Using default config.", path.display());
            return Self::default();
        }

        match Self::from_file(path) {
            Ok(config) => {
                log::info!("Config loaded from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Resolved history file location.
    pub fn history_path(&self) -> PathBuf {
        self.history_path
            .clone()
            .unwrap_or_else(crate::paths::get_history_path)
    }
}
