//! Unified error types for brevis-bot.
//!
//! Module-specific errors convert into the main [`BotError`] type used
//! throughout the binary.

use brevis::pipeline::PipelineError;

/// The main error type for brevis-bot operations.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Summarization pipeline error.
    #[error("pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    /// Telegram transport error.
    #[error("telegram: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// File download error.
    #[error("download: {0}")]
    Download(#[from] teloxide::DownloadError),

    /// Configuration error.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("{0}")]
    Internal(String),
}

impl BotError {
    /// Create a config error from a string.
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(ConfigError::Invalid(msg.into()))
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias for brevis-bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// Missing required field.
    #[error("missing: {0}")]
    Missing(String),

    /// Invalid value.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create a missing field error.
    #[inline]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing(field.into())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
