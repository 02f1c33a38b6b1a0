//! Brevis Bot - a Telegram bot that transcribes and summarizes voice messages.
//!
//! This crate hosts the [`brevis`] summarization pipeline behind a Telegram
//! transport:
//!
//! - **Bot** ([`bot`]) - teloxide dispatcher for voice and audio messages
//! - **Config** ([`config`]) - JSON configuration with environment overlays
//! - **Errors** ([`error`]) - the bot-level error hierarchy
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use brevis_bot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = load_config().await.unwrap_or_default();
//!     let token = config.telegram_token().ok_or_else(|| {
//!         BotError::config("no Telegram bot token configured")
//!     })?;
//!     // build a pipeline, then:
//!     // VoiceBot::new(VoiceBotConfig::new(token), pipeline).run().await
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bot::{VoiceBot, VoiceBotConfig};
    pub use crate::config::{
        BotConfig, LlmConfig, TelegramConfig, TranscriptionConfig, config_path, init_config,
        load_config, load_config_from, save_config,
    };
    pub use crate::error::{BotError, ConfigError, ConfigResult, Result};
}
