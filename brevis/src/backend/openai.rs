//! OpenAI-compatible remote backend.
//!
//! Speaks the Chat Completions API. Works with the official endpoint as well
//! as compatible proxies via a custom base URL.

use super::{InferenceError, InferenceResult, LlmBackend};
use crate::prompt::BackendKind;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::sync::Arc;
use tracing::debug;

/// Default OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model when none is configured.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Remote backend over the OpenAI Chat Completions API.
///
/// # Example
///
/// ```rust,ignore
/// let backend = OpenAiBackend::builder()
///     .api_key("sk-...")
///     .model("gpt-4o-mini")
///     .build();
/// ```
#[derive(Clone)]
pub struct OpenAiBackend {
    http_client: reqwest::Client,
    api_key: Option<Arc<str>>,
    base_url: Arc<str>,
    model: Arc<str>,
    temperature: f32,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    /// Create a backend with the given API key and the default model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder().api_key(api_key).build()
    }

    /// Create a new builder.
    #[must_use]
    pub fn builder() -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::default()
    }

    /// Create a backend from environment variables.
    ///
    /// Reads `OPENAI_API_KEY` (may be absent; calls then fail with
    /// [`InferenceError::MissingApiKey`]) and optionally `OPENAI_BASE_URL`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut builder = Self::builder();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            builder = builder.base_url(base_url);
        }
        builder.build()
    }

    /// The configured model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn auth_headers(&self) -> InferenceResult<HeaderMap> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(InferenceError::MissingApiKey)?;

        let mut headers = HeaderMap::with_capacity(2);
        let value = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| InferenceError::Request(e.to_string()))?;
        headers.insert(AUTHORIZATION, value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn complete(&self, prompt: &str) -> InferenceResult<String> {
        let headers = self.auth_headers()?;
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": &*self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "sending completion request");

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api(format!("HTTP {status}: {text}")));
        }

        let json: serde_json::Value = response.json().await?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| {
                InferenceError::MalformedResponse("missing choices[0].message.content".to_string())
            })
    }
}

/// Builder for [`OpenAiBackend`].
#[derive(Debug, Default)]
pub struct OpenAiBackendBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

impl OpenAiBackendBuilder {
    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set a custom base URL (Azure, proxies, compatible servers).
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

    /// Set the sampling temperature. Defaults to 0 for stable summaries.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the request timeout in seconds. Default is no timeout.
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
    pub fn build(self) -> OpenAiBackend {
        let base_url = self.base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string());
        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(timeout));
        }
        let http_client = builder.build().expect("failed to build HTTP client");

        OpenAiBackend {
            http_client,
            api_key: self.api_key.map(Into::into),
            base_url: base_url.into(),
            model: model.into(),
            temperature: self.temperature.unwrap_or(0.0),
        }
    }
}
