//! Error taxonomy for the extraction pipeline.
//!
//! Every variant records the stage that failed so callers can attribute
//! blame without parsing messages.

use std::fmt;

use thiserror::Error;

/// Pipeline stage names, used for error attribution and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalize,
    Recognize,
    HistoryRead,
    HistoryWrite,
    Config,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Recognize => "recognize",
            Stage::HistoryRead => "history-read",
            Stage::HistoryWrite => "history-write",
            Stage::Config => "config",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the extraction pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input bytes are not a decodable image. Not retryable.
    #[error("[normalize] image decode failed: {message}")]
    ImageDecode { message: String },

    /// The OCR engine crashed, timed out, or could not be started.
    #[error("[recognize] text recognition failed: {message}")]
    Recognition { message: String },

    /// History store read or write failure.
    #[error("[{stage}] history store error: {message}")]
    Store { stage: Stage, message: String },

    /// Configuration could not be read or parsed.
    #[error("[config] invalid configuration: {message}")]
    Config { message: String },
}

impl PipelineError {
    pub fn image_decode(message: impl fmt::Display) -> Self {
        Self::ImageDecode {
            message: message.to_string(),
        }
    }

    pub fn recognition(message: impl fmt::Display) -> Self {
        Self::Recognition {
            message: message.to_string(),
        }
    }

    pub fn store_read(message: impl fmt::Display) -> Self {
        Self::Store {
            stage: Stage::HistoryRead,
            message: message.to_string(),
        }
    }

    pub fn store_write(message: impl fmt::Display) -> Self {
        Self::Store {
            stage: Stage::HistoryWrite,
            message: message.to_string(),
        }
    }

    /// The stage this error originated from.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::ImageDecode { .. } => Stage::Normalize,
            PipelineError::Recognition { .. } => Stage::Recognize,
            PipelineError::Store { stage, .. } => *stage,
            PipelineError::Config { .. } => Stage::Config,
        }
    }

    /// Whether re-running the whole pipeline on the same input may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            PipelineError::ImageDecode { .. } | PipelineError::Config { .. }
        )
    }
}
