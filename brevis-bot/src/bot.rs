//! Telegram transport using teloxide.
//!
//! Receives voice and audio messages, feeds them through the summarization
//! pipeline, and replies with the transcript and the summary. Text handling
//! is limited to the `/start` greeting; everything interesting arrives as
//! audio.

use crate::error::Result;
use brevis::pipeline::SummaryPipeline;
use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tracing::{debug, error, info};

/// Greeting for `/start` and `/help`.
const GREETING: &str =
    "I'm a voice-to-text transcriber and summary bot. Send me voice messages or audio files!";

/// Telegram bot configuration.
#[derive(Debug, Clone)]
pub struct VoiceBotConfig {
    /// Bot token from `@BotFather`.
    pub token: String,
    /// Allowed user IDs. Empty means allow all (not recommended).
    pub allowed_users: Vec<i64>,
    /// Maximum message length before splitting replies.
    pub max_message_length: usize,
}

impl VoiceBotConfig {
    /// Create a new config with the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            allowed_users: Vec::new(),
            max_message_length: 4096, // Telegram's limit
        }
    }

    /// Add an allowed user ID.
    #[must_use]
    pub fn allow_user(mut self, user_id: i64) -> Self {
        self.allowed_users.push(user_id);
        self
    }

    /// Add multiple allowed user IDs.
    #[must_use]
    pub fn allow_users(mut self, user_ids: impl IntoIterator<Item = i64>) -> Self {
        self.allowed_users.extend(user_ids);
        self
    }

    /// Check if a user is allowed.
    #[must_use]
    pub fn is_user_allowed(&self, user_id: i64) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&user_id)
    }
}

/// The Telegram voice-summary bot.
pub struct VoiceBot {
    config: VoiceBotConfig,
    pipeline: Arc<SummaryPipeline>,
}

impl std::fmt::Debug for VoiceBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceBot")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl VoiceBot {
    /// Create a new bot over the given pipeline.
    #[must_use]
    pub fn new(config: VoiceBotConfig, pipeline: Arc<SummaryPipeline>) -> Self {
        Self { config, pipeline }
    }

    /// Run the bot until the process is stopped.
    ///
    /// # Errors
    ///
    /// Currently only fails during startup; dispatch errors are logged.
    pub async fn run(self) -> Result<()> {
        let bot = Bot::new(&self.config.token);
        let pipeline = Arc::clone(&self.pipeline);
        let allowed_users = self.config.allowed_users.clone();
        let max_len = self.config.max_message_length;

        let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let pipeline = Arc::clone(&pipeline);
            let allowed_users = allowed_users.clone();

            async move {
                #[allow(clippy::cast_possible_wrap)] // User ID won't exceed i64 max
                let user_id = msg.from.as_ref().map_or(0, |u| u.id.0 as i64);
                let user_allowed =
                    allowed_users.is_empty() || allowed_users.contains(&user_id);
                if !user_allowed {
                    debug!(user_id, "message from unauthorized user");
                    return Ok::<(), teloxide::RequestError>(());
                }

                if let Some(text) = msg.text() {
                    if text == "/start" || text == "/help" {
                        bot.send_message(msg.chat.id, GREETING).await?;
                    }
                    return Ok(());
                }

                let Some((file_id, filename)) = audio_attachment(&msg) else {
                    return Ok(());
                };

                info!(user_id, %filename, "received audio message");

                if let Err(e) =
                    handle_audio(&bot, &msg, &pipeline, file_id, &filename, max_len).await
                {
                    error!(error = %e, "failed to summarize audio message");
                    let _ = bot
                        .send_message(
                            msg.chat.id,
                            "Sorry, I couldn't process that audio message.",
                        )
                        .await;
                }

                Ok(())
            }
        });

        info!("Telegram bot starting");

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

/// Extract the downloadable attachment from a message, if it carries audio.
fn audio_attachment(msg: &Message) -> Option<(teloxide::types::FileId, String)> {
    if let Some(voice) = msg.voice() {
        // Telegram voice notes are always OGG/Opus.
        return Some((voice.file.id.clone(), "voice.ogg".to_string()));
    }
    if let Some(audio) = msg.audio() {
        let filename = audio
            .file_name
            .clone()
            .unwrap_or_else(|| "audio.mp3".to_string());
        return Some((audio.file.id.clone(), filename));
    }
    None
}

/// Download the audio, run the pipeline, reply with transcript and summary.
async fn handle_audio(
    bot: &Bot,
    msg: &Message,
    pipeline: &SummaryPipeline,
    file_id: teloxide::types::FileId,
    filename: &str,
    max_len: usize,
) -> crate::error::Result<()> {
    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let file = bot.get_file(file_id).await?;
    let mut data = Vec::new();
    bot.download_file(&file.path, &mut data).await?;
    debug!(bytes = data.len(), "downloaded audio file");

    let result = pipeline.run_bytes(&data, filename).await?;

    send_long(bot, msg.chat.id, &format!("Transcript:\n{}", result.full_text), max_len).await?;
    send_long(bot, msg.chat.id, &format!("Summary:\n{}", result.summary), max_len).await?;

    Ok(())
}

/// Send a message, splitting it when it exceeds Telegram's length limit.
async fn send_long(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    max_len: usize,
) -> crate::error::Result<()> {
    for chunk in split_message(text, max_len) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

/// Split a long message into pieces of at most `max_len` characters,
/// preferring line boundaries and never cutting inside a codepoint.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.lines() {
        let line_len = line.chars().count();

        if line_len > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_len.max(1)) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let added = if current.is_empty() {
            line_len
        } else {
            current_len + 1 + line_len
        };

        if added > max_len {
            chunks.push(std::mem::take(&mut current));
            current.push_str(line);
            current_len = line_len;
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            current_len = added;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
