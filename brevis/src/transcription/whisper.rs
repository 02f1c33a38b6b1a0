//! OpenAI Whisper transcription provider.

use super::provider::{
    AudioFormat, TranscribeResult, Transcriber, Transcript, TranscriptionError,
};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// OpenAI audio transcription endpoint.
const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Default Whisper model.
const DEFAULT_MODEL: &str = "whisper-1";

/// Transcription provider using the OpenAI Whisper API.
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    api_key: Option<String>,
    model: String,
    url: String,
}

impl WhisperTranscriber {
    /// Create a new transcriber with an API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            url: WHISPER_URL.to_string(),
        }
    }

    /// Create a transcriber from the `OPENAI_API_KEY` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            model: DEFAULT_MODEL.to_string(),
            url: WHISPER_URL.to_string(),
        }
    }

    /// Set the model to use.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a different transcription endpoint (compatible proxies).
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn get_api_key(&self) -> TranscribeResult<&str> {
        self.api_key
            .as_deref()
            .ok_or(TranscriptionError::MissingApiKey)
    }

    async fn transcribe_bytes_internal(
        &self,
        data: &[u8],
        filename: &str,
        format: AudioFormat,
        api_key: &str,
    ) -> TranscribeResult<Transcript> {
        use reqwest::multipart::{Form, Part};

        let client = reqwest::Client::new();

        let file_part = Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(format.mime_type())
            .map_err(|e| TranscriptionError::Request(e.to_string()))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let response = client
            .post(&self.url)
            .header("Authorization", format!("Bearer {api_key}"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::Api(format!("HTTP {status}: {body}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Request(e.to_string()))?;

        let text = json["text"].as_str().unwrap_or("").to_string();
        let duration = json["duration"].as_f64();
        let language = json["language"].as_str().map(String::from);

        info!(
            text_len = text.len(),
            duration = ?duration,
            language = ?language,
            "transcription complete"
        );

        Ok(Transcript {
            text,
            duration,
            language,
        })
    }
}

impl Default for WhisperTranscriber {
    fn default() -> Self {
        Self::from_env()
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    fn name(&self) -> &'static str {
        "openai-whisper"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn transcribe(&self, path: &Path) -> TranscribeResult<Transcript> {
        let api_key = self.get_api_key()?;

        if !path.exists() {
            return Err(TranscriptionError::FileNotFound(path.display().to_string()));
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("ogg");
        let format = AudioFormat::from_extension(extension)
            .ok_or_else(|| TranscriptionError::UnsupportedFormat(extension.to_string()))?;

        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.ogg");

        debug!(path = %path.display(), format = ?format, "transcribing audio file");

        self.transcribe_bytes_internal(&data, filename, format, api_key)
            .await
    }

    async fn transcribe_bytes(&self, data: &[u8], filename: &str) -> TranscribeResult<Transcript> {
        let api_key = self.get_api_key()?;

        let extension = filename.rsplit('.').next().unwrap_or("ogg");
        let format = AudioFormat::from_extension(extension)
            .ok_or_else(|| TranscriptionError::UnsupportedFormat(extension.to_string()))?;

        self.transcribe_bytes_internal(data, filename, format, api_key)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcriber_creation() {
        let transcriber = WhisperTranscriber::new("test-key");
        assert!(transcriber.is_available());
        assert_eq!(transcriber.name(), "openai-whisper");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let transcriber = WhisperTranscriber::new("test-key");
        let err = transcriber
            .transcribe(Path::new("/nonexistent/audio.ogg"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn unsupported_extension_is_reported() {
        let transcriber = WhisperTranscriber::new("test-key");
        let err = transcriber
            .transcribe_bytes(b"data", "notes.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::UnsupportedFormat(_)));
    }
}
