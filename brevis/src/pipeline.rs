//! Map-reduce summarization pipeline.
//!
//! One invocation runs transcription, chunking, and summarization in order.
//! Texts that fit in a single model call are summarized directly; longer
//! texts go through a map phase (one call per chunk, bounded concurrency)
//! followed by a reduce phase that combines partial summaries, re-chunking
//! and re-summarizing until the combination fits in one call.
//!
//! The pipeline is read-only configuration after construction and can be
//! shared across concurrent invocations.

use crate::backend::{InferenceError, LlmBackend};
use crate::chunker::{self, CHARS_PER_TOKEN, Chunk};
use crate::prompt::{PromptSet, PromptTemplate};
use crate::transcription::{Transcriber, TranscriptionError};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Error type for pipeline invocations.
///
/// Any failure aborts the whole invocation; no partial summaries are
/// returned. Degenerate inputs (empty transcript, oversize atomic chunk)
/// are handled by policy and never raised as errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Upstream transcription failure.
    #[error("transcription: {0}")]
    Transcription(#[from] TranscriptionError),

    /// Backend call failure during map, combine, or direct summarize.
    #[error("inference: {0}")]
    Inference(#[from] InferenceError),
}

/// Result type for pipeline invocations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Output of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct SummaryResult {
    /// The final summary.
    pub summary: String,
    /// The complete transcript the summary was produced from.
    pub full_text: String,
}

/// Pipeline sizing and concurrency configuration.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Token budget per model call, converted to characters via
    /// [`CHARS_PER_TOKEN`] unless `max_chunk_chars` overrides it.
    pub token_budget: usize,
    /// Explicit character budget per chunk. `None` derives it from
    /// `token_budget`.
    pub max_chunk_chars: Option<usize>,
    /// Upper bound on concurrent map-phase backend calls.
    pub map_concurrency: usize,
    /// Maximum reduction levels before the truncate-and-summarize fallback
    /// kicks in. Guards against summaries that fail to shrink.
    pub max_reduce_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            token_budget: 4000,
            max_chunk_chars: None,
            map_concurrency: 4,
            max_reduce_depth: 5,
        }
    }
}

impl PipelineConfig {
    /// The effective character budget per chunk.
    #[must_use]
    pub fn effective_max_chars(&self) -> usize {
        self.max_chunk_chars
            .unwrap_or(self.token_budget * CHARS_PER_TOKEN)
            .max(1)
    }
}

/// The summarization pipeline.
///
/// Built once from a [`PipelineConfig`], a backend, and a transcriber;
/// owned by whatever hosts it (bot, CLI, or test harness).
pub struct SummaryPipeline {
    backend: Arc<dyn LlmBackend>,
    transcriber: Arc<dyn Transcriber>,
    prompts: PromptSet,
    max_chunk_chars: usize,
    map_concurrency: usize,
    max_reduce_depth: usize,
}

impl std::fmt::Debug for SummaryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryPipeline")
            .field("backend", &self.backend.name())
            .field("transcriber", &self.transcriber.name())
            .field("max_chunk_chars", &self.max_chunk_chars)
            .field("map_concurrency", &self.map_concurrency)
            .finish_non_exhaustive()
    }
}

impl SummaryPipeline {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> SummaryPipelineBuilder {
        SummaryPipelineBuilder::default()
    }

    /// Run one full invocation: transcribe the audio file, summarize the
    /// transcript, and package the result.
    ///
    /// # Errors
    ///
    /// Fails if transcription or any backend call fails. No partial results.
    pub async fn run(&self, audio: &Path) -> PipelineResult<SummaryResult> {
        let transcript = self.transcriber.transcribe(audio).await?;
        let summary = self.summarize_text(&transcript.text).await?;
        Ok(SummaryResult {
            summary,
            full_text: transcript.text,
        })
    }

    /// Like [`run`](Self::run) but transcribing from in-memory audio bytes.
    ///
    /// # Errors
    ///
    /// Fails if transcription or any backend call fails.
    pub async fn run_bytes(&self, data: &[u8], filename: &str) -> PipelineResult<SummaryResult> {
        let transcript = self.transcriber.transcribe_bytes(data, filename).await?;
        let summary = self.summarize_text(&transcript.text).await?;
        Ok(SummaryResult {
            summary,
            full_text: transcript.text,
        })
    }

    /// Summarize an already-transcribed text.
    ///
    /// Branches on chunk count: exactly one chunk is summarized directly
    /// with the single-call template, more than one goes through map-reduce.
    /// An empty text yields an empty summary without any backend call.
    ///
    /// # Errors
    ///
    /// Fails if any backend call fails.
    pub async fn summarize_text(&self, text: &str) -> PipelineResult<String> {
        let chunks = chunker::split_text(text, self.max_chunk_chars);

        match chunks.len() {
            0 => {
                debug!("empty transcript, nothing to summarize");
                Ok(String::new())
            }
            1 => {
                info!(chars = text.len(), "direct summarization");
                let summary = self
                    .summarize_chunk(&chunks[0].content, &self.prompts.single)
                    .await?;
                Ok(summary)
            }
            n => {
                info!(chars = text.len(), chunks = n, "map-reduce summarization");
                let partials = self.map_chunks(&chunks, &self.prompts.map).await?;
                self.reduce(partials).await
            }
        }
    }

    /// Render the template, run one completion, trim the response.
    async fn summarize_chunk(
        &self,
        text: &str,
        template: &PromptTemplate,
    ) -> Result<String, InferenceError> {
        let prompt = template.render(text);
        let response = self.backend.complete(&prompt).await?;
        Ok(response.trim().to_string())
    }

    /// Map phase: summarize each chunk independently with bounded
    /// concurrency. Order-preserving; the first failure aborts and any
    /// completed partials are discarded.
    async fn map_chunks(
        &self,
        chunks: &[Chunk],
        template: &PromptTemplate,
    ) -> Result<Vec<String>, InferenceError> {
        // The futures are collected up front instead of being mapped lazily
        // inside the stream; the closure-bearing stream type otherwise makes
        // callers fail `Send` checks with "implementation of `Send` is not
        // general enough" (rust-lang/rust#102211). Async fn bodies still run
        // only when polled, so this changes nothing observable.
        let calls: Vec<_> = chunks
            .iter()
            .map(|chunk| self.summarize_chunk(&chunk.content, template))
            .collect();
        stream::iter(calls)
            .buffered(self.map_concurrency.max(1))
            .try_collect()
            .await
    }

    /// Reduce phase: combine partial summaries into one.
    ///
    /// Each level joins the partials and either combine-summarizes them in a
    /// single call (when they fit the budget) or re-chunks and re-summarizes
    /// into a smaller set. Bounded by `max_reduce_depth`; at the cap the
    /// combination is truncated to the budget and summarized once rather
    /// than looping on non-shrinking summaries.
    async fn reduce(&self, mut partials: Vec<String>) -> PipelineResult<String> {
        for level in 0..self.max_reduce_depth {
            let combined = partials.join("\n");
            if combined.chars().count() <= self.max_chunk_chars {
                debug!(level, "combining partial summaries in one call");
                let summary = self
                    .summarize_chunk(&combined, &self.prompts.combine)
                    .await?;
                return Ok(summary);
            }

            let chunks = chunker::split_text(&combined, self.max_chunk_chars);
            debug!(level, chunks = chunks.len(), "re-chunking combined summaries");
            partials = self.map_chunks(&chunks, &self.prompts.combine).await?;
        }

        warn!(
            depth = self.max_reduce_depth,
            "summaries did not shrink; truncating before final combine"
        );
        let combined = partials.join("\n");
        let truncated = truncate_chars(&combined, self.max_chunk_chars);
        let summary = self
            .summarize_chunk(&truncated, &self.prompts.combine)
            .await?;
        Ok(summary)
    }
}

/// Truncate to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Builder for [`SummaryPipeline`].
pub struct SummaryPipelineBuilder {
    backend: Option<Arc<dyn LlmBackend>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    prompts: Option<PromptSet>,
    config: PipelineConfig,
}

impl std::fmt::Debug for SummaryPipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryPipelineBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for SummaryPipelineBuilder {
    fn default() -> Self {
        Self {
            backend: None,
            transcriber: None,
            prompts: None,
            config: PipelineConfig::default(),
        }
    }
}

impl SummaryPipelineBuilder {
    /// Set the language-model backend.
    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the transcription provider.
    #[must_use]
    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Override the prompt set. Defaults to the built-in set for the
    /// backend's kind.
    #[must_use]
    pub fn prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Set the pipeline configuration.
    #[must_use]
    pub const fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the pipeline.
    ///
    /// # Panics
    ///
    /// Panics if the backend or transcriber is not set.
    #[must_use]
    pub fn build(self) -> SummaryPipeline {
        let backend = self.backend.expect("backend is required");
        let transcriber = self.transcriber.expect("transcriber is required");
        let prompts = self
            .prompts
            .unwrap_or_else(|| PromptSet::builtin(backend.kind()));

        SummaryPipeline {
            prompts,
            max_chunk_chars: self.config.effective_max_chars(),
            map_concurrency: self.config.map_concurrency,
            max_reduce_depth: self.config.max_reduce_depth,
            backend,
            transcriber,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::transcription::{TranscribeResult, Transcript};
    use async_trait::async_trait;

    /// Transcriber that returns a fixed text without touching audio.
    struct FixedTranscriber(String);

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn transcribe(&self, _path: &Path) -> TranscribeResult<Transcript> {
            Ok(Transcript {
                text: self.0.clone(),
                duration: None,
                language: None,
            })
        }

        async fn transcribe_bytes(
            &self,
            _data: &[u8],
            _filename: &str,
        ) -> TranscribeResult<Transcript> {
            self.transcribe(Path::new("")).await
        }
    }

    fn pipeline_with(
        backend: MockBackend,
        transcript: &str,
        config: PipelineConfig,
    ) -> SummaryPipeline {
        SummaryPipeline::builder()
            .backend(Arc::new(backend))
            .transcriber(Arc::new(FixedTranscriber(transcript.to_string())))
            .config(config)
            .build()
    }

    fn config(max_chunk_chars: usize) -> PipelineConfig {
        PipelineConfig {
            max_chunk_chars: Some(max_chunk_chars),
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn empty_text_makes_no_backend_calls() {
        let backend = MockBackend::fixed("unused");
        let counter = backend.clone();
        let pipeline = pipeline_with(backend, "", config(100));

        let summary = pipeline.summarize_text("").await.unwrap();
        assert_eq!(summary, "");
        assert_eq!(counter.call_count(), 0);
    }

    #[tokio::test]
    async fn short_text_takes_direct_path() {
        let backend = MockBackend::fixed("  a summary  ");
        let counter = backend.clone();
        let pipeline = pipeline_with(backend, "", config(16000));

        let summary = pipeline.summarize_text("short voice note").await.unwrap();
        assert_eq!(summary, "a summary");
        assert_eq!(counter.call_count(), 1);
    }

    #[tokio::test]
    async fn single_chunk_uses_single_template() {
        let backend = MockBackend::with(|_, prompt| Ok(prompt.to_string()));
        let pipeline = pipeline_with(backend, "", config(16000));

        let echoed = pipeline.summarize_text("note body").await.unwrap();
        // The single-call remote template mentions the full message, not a part.
        assert!(echoed.contains("transcribed voice message"));
        assert!(!echoed.contains("part of a transcribed"));
        assert!(echoed.contains("note body"));
    }

    #[tokio::test]
    async fn builder_picks_prompts_from_backend_kind() {
        use crate::prompt::BackendKind;
        use std::sync::Mutex;

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let backend = MockBackend::with(move |_, prompt| {
            captured.lock().unwrap().push(prompt.to_string());
            Ok("done".to_string())
        })
        .with_kind(BackendKind::Local);
        let pipeline = pipeline_with(backend, "", config(16000));

        pipeline.summarize_text("note body").await.unwrap();

        // No explicit prompt set: the builder must pick the dialogue-style
        // set matching the backend's advertised kind.
        let expected = PromptSet::builtin(BackendKind::Local)
            .single
            .render("note body");
        assert_eq!(*seen.lock().unwrap(), vec![expected]);
    }

    #[tokio::test]
    async fn long_text_maps_then_reduces() {
        let backend = MockBackend::fixed("tiny");
        let counter = backend.clone();
        let pipeline = pipeline_with(backend, "", config(20));

        let text = "alpha beta\n\ngamma delta\n\nepsilon zeta\n\neta theta";
        let summary = pipeline.summarize_text(text).await.unwrap();
        assert_eq!(summary, "tiny");

        let chunks = chunker::split_text(text, 20).len();
        assert!(chunks >= 2);
        // One call per chunk plus one combine call.
        assert_eq!(counter.call_count(), chunks + 1);
    }

    #[tokio::test]
    async fn map_failure_aborts_whole_invocation() {
        let backend = MockBackend::failing_at(1, "ok");
        let pipeline = pipeline_with(backend, "", config(10));

        let text = "one two three\n\nfour five six\n\nseven eight nine";
        let err = pipeline.summarize_text(text).await.unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
    }

    #[tokio::test]
    async fn non_shrinking_summaries_terminate_via_truncation() {
        // Every "summary" is as long as a full chunk, so reduction can
        // never converge; the depth cap must force termination.
        let backend = MockBackend::fixed("y".repeat(40));
        let counter = backend.clone();
        let pipeline = pipeline_with(
            backend,
            "",
            PipelineConfig {
                max_chunk_chars: Some(20),
                max_reduce_depth: 2,
                ..PipelineConfig::default()
            },
        );

        let text = "a".repeat(30) + "\n\n" + &"b".repeat(30);
        let summary = pipeline.summarize_text(&text).await.unwrap();
        assert!(!summary.is_empty());
        // Bounded: map + at most depth levels of re-chunking + final combine.
        assert!(counter.call_count() < 50);
    }

    #[tokio::test]
    async fn run_packages_summary_and_full_text() {
        let backend = MockBackend::fixed("the summary");
        let pipeline = pipeline_with(backend, "hello from the transcript", config(16000));

        let result = pipeline.run(Path::new("ignored.ogg")).await.unwrap();
        assert_eq!(result.summary, "the summary");
        assert_eq!(result.full_text, "hello from the transcript");
    }

    #[tokio::test]
    async fn transcription_failure_aborts() {
        struct FailingTranscriber;

        #[async_trait]
        impl Transcriber for FailingTranscriber {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn is_available(&self) -> bool {
                false
            }
            async fn transcribe(&self, _path: &Path) -> TranscribeResult<Transcript> {
                Err(crate::transcription::TranscriptionError::Api(
                    "down".to_string(),
                ))
            }
            async fn transcribe_bytes(
                &self,
                _data: &[u8],
                _filename: &str,
            ) -> TranscribeResult<Transcript> {
                self.transcribe(Path::new("")).await
            }
        }

        let backend = MockBackend::fixed("unused");
        let counter = backend.clone();
        let pipeline = SummaryPipeline::builder()
            .backend(Arc::new(backend))
            .transcriber(Arc::new(FailingTranscriber))
            .build();

        let err = pipeline.run(Path::new("x.ogg")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Transcription(_)));
        assert_eq!(counter.call_count(), 0);
    }

    #[test]
    fn effective_max_chars_derivation() {
        let config = PipelineConfig::default();
        assert_eq!(config.effective_max_chars(), 16000);

        let overridden = PipelineConfig {
            max_chunk_chars: Some(500),
            ..PipelineConfig::default()
        };
        assert_eq!(overridden.effective_max_chars(), 500);
    }
}
