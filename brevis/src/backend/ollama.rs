//! Local backend over an Ollama server.
//!
//! Ollama runs locally and needs no API key. Uses the `/api/generate`
//! endpoint with streaming disabled.

use super::{InferenceError, InferenceResult, LlmBackend};
use crate::prompt::BackendKind;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Default Ollama API base URL (local server).
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default model when none is configured.
const DEFAULT_MODEL: &str = "llama3.2";

/// Local backend for an Ollama inference server.
///
/// # Example
///
/// ```rust,ignore
/// // Default local server
/// let backend = OllamaBackend::new();
///
/// // Remote Ollama host
/// let backend = OllamaBackend::builder()
///     .base_url("http://192.168.1.100:11434")
///     .model("qwen2.5")
///     .build();
/// ```
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: reqwest::Client,
    base_url: Arc<str>,
    model: Arc<str>,
}

impl std::fmt::Debug for OllamaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaBackend {
    /// Create a backend against the default local server.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new builder.
    #[must_use]
    pub fn builder() -> OllamaBackendBuilder {
        OllamaBackendBuilder::default()
    }

    /// The configured model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check whether the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not respond.
    pub async fn health_check(&self) -> Result<bool, reqwest::Error> {
        let response = self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn complete(&self, prompt: &str) -> InferenceResult<String> {
        let url = format!("{}/api/generate", self.base_url);

        let body = serde_json::json!({
            "model": &*self.model,
            "prompt": prompt,
            "stream": false,
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "sending generate request");

        let response = self.http_client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api(format!("HTTP {status}: {text}")));
        }

        let json: serde_json::Value = response.json().await?;
        json["response"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| InferenceError::MalformedResponse("missing response field".to_string()))
    }
}

/// Builder for [`OllamaBackend`].
#[derive(Debug, Default)]
pub struct OllamaBackendBuilder {
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

impl OllamaBackendBuilder {
    /// Set a custom base URL for a remote Ollama server.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the request timeout in seconds.
    ///
    /// Default is no timeout; local inference can be slow.
    #[must_use]
    pub const fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    /// Build the backend.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client fails to build.
    #[must_use]
    pub fn build(self) -> OllamaBackend {
        let base_url = self.base_url.unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(timeout));
        }
        let http_client = builder.build().expect("failed to build HTTP client");

        OllamaBackend {
            http_client,
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}
