//! Language-model backend abstraction.
//!
//! The pipeline talks to one [`LlmBackend`] selected at construction time.
//! Two real implementations exist (a hosted OpenAI-compatible API and a local
//! Ollama server) plus a deterministic [`MockBackend`] for tests and offline
//! runs. Backends never retry; a failed call surfaces untransformed and the
//! whole pipeline invocation aborts.

mod mock;
mod ollama;
mod openai;

pub use mock::MockBackend;
pub use ollama::{OLLAMA_BASE_URL, OllamaBackend, OllamaBackendBuilder};
pub use openai::{OPENAI_BASE_URL, OpenAiBackend, OpenAiBackendBuilder};

use crate::prompt::BackendKind;
use async_trait::async_trait;

/// Error type for backend inference calls.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// API key not configured.
    #[error("API key not configured")]
    MissingApiKey,
    /// The backend returned a non-success status.
    #[error("API error: {0}")]
    Api(String),
    /// The request could not be sent or the response body not read.
    #[error("request error: {0}")]
    Request(String),
    /// The response arrived but did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// Result type for backend inference calls.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// A synchronous-per-call language model: one prompt in, one completion out.
///
/// Implementations must be safe for concurrent use; the pipeline issues
/// parallel calls during the map phase.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Which prompt wording this backend expects.
    fn kind(&self) -> BackendKind;

    /// Run one completion. The returned text is the raw model output;
    /// callers trim incidental whitespace.
    async fn complete(&self, prompt: &str) -> InferenceResult<String>;
}
