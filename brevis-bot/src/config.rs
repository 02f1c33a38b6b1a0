//! Bot configuration: JSON file under the home directory with an
//! environment-variable overlay for secrets.
//!
//! `TELEGRAM_BOT_TOKEN` and `OPENAI_API_KEY` always come from the
//! environment when set; the file holds everything else.

use crate::error::{ConfigError, ConfigResult};
use brevis::prompt::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level bot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Telegram transport settings.
    pub telegram: TelegramConfig,
    /// Language-model backend settings.
    pub llm: LlmConfig,
    /// Transcription settings.
    pub transcription: TranscriptionConfig,
}

/// Telegram transport settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from `@BotFather`. Overridden by `TELEGRAM_BOT_TOKEN`.
    pub token: Option<String>,
    /// Allowed Telegram user IDs. Empty means allow all (not recommended).
    pub allow_from: Vec<i64>,
}

/// Language-model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which backend to use: `remote` (OpenAI) or `local` (Ollama).
    pub backend: BackendKind,
    /// Model identifier. `None` uses the backend's default.
    pub model: Option<String>,
    /// Base URL override (proxies, remote Ollama hosts).
    pub base_url: Option<String>,
    /// Token budget per model call.
    pub token_budget: usize,
    /// Concurrent map-phase calls.
    pub map_concurrency: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Remote,
            model: None,
            base_url: None,
            token_budget: 4000,
            map_concurrency: 4,
        }
    }
}

/// Transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Whisper model identifier.
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
        }
    }
}

impl BotConfig {
    /// The effective telegram token: environment first, then the file.
    #[must_use]
    pub fn telegram_token(&self) -> Option<String> {
        std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .or_else(|| self.telegram.token.clone())
    }

    /// Validate the configuration for running the bot.
    ///
    /// # Errors
    ///
    /// Returns an error when a required field is missing.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.telegram_token().is_none() {
            return Err(ConfigError::missing(
                "telegram.token (or TELEGRAM_BOT_TOKEN)",
            ));
        }
        if self.llm.token_budget == 0 {
            return Err(ConfigError::Invalid(
                "llm.token_budget must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default configuration file path: `~/.brevis/config.json`.
#[must_use]
pub fn config_path() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".brevis")
        .join("config.json")
}

/// Load configuration from the default path.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub async fn load_config() -> ConfigResult<BotConfig> {
    load_config_from(&config_path()).await
}

/// Load configuration from an explicit path.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub async fn load_config_from(path: &std::path::Path) -> ConfigResult<BotConfig> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Save configuration to the default path, creating directories as needed.
///
/// # Errors
///
/// Fails on IO or serialization errors.
pub async fn save_config(config: &BotConfig) -> ConfigResult<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(&path, content).await?;
    Ok(())
}

/// Write a default configuration file.
///
/// # Errors
///
/// Fails on IO or serialization errors.
pub async fn init_config() -> ConfigResult<()> {
    save_config(&BotConfig::default()).await
}
