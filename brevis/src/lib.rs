//! Brevis - voice transcript summarization.
//!
//! Turns arbitrarily long transcribed audio into one natural-language
//! summary while respecting a hard per-call size bound on the language
//! model. The crate provides:
//!
//! - **Chunker** ([`chunker`]) - recursive bounded-size text splitting
//! - **Prompts** ([`prompt`]) - per-backend prompt template sets
//! - **Backends** ([`backend`]) - remote (OpenAI), local (Ollama), and mock
//!   language-model implementations behind one trait
//! - **Transcription** ([`transcription`]) - the audio-to-text collaborator
//! - **Pipeline** ([`pipeline`]) - the map-reduce orchestration over all of
//!   the above
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use brevis::prelude::*;
//! use std::sync::Arc;
//!
//! let pipeline = SummaryPipeline::builder()
//!     .backend(Arc::new(OpenAiBackend::from_env()))
//!     .transcriber(Arc::new(WhisperTranscriber::from_env()))
//!     .build();
//!
//! let result = pipeline.run("voice.ogg".as_ref()).await?;
//! println!("{}", result.summary);
//! ```

pub mod backend;
pub mod chunker;
pub mod pipeline;
pub mod prompt;
pub mod transcription;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::backend::{
        InferenceError, InferenceResult, LlmBackend, MockBackend, OllamaBackend, OpenAiBackend,
    };
    pub use crate::chunker::{CHARS_PER_TOKEN, Chunk, split_text};
    pub use crate::pipeline::{
        PipelineConfig, PipelineError, PipelineResult, SummaryPipeline, SummaryPipelineBuilder,
        SummaryResult,
    };
    pub use crate::prompt::{BackendKind, PromptSet, PromptTemplate};
    pub use crate::transcription::{
        AudioFormat, TranscribeResult, Transcriber, Transcript, TranscriptionError,
        WhisperTranscriber,
    };
}
