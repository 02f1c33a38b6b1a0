//! Deterministic backend for tests and offline runs.

use super::{InferenceError, InferenceResult, LlmBackend};
use crate::prompt::BackendKind;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type ReplyFn = dyn Fn(usize, &str) -> InferenceResult<String> + Send + Sync;

/// A scripted [`LlmBackend`] that answers without network access.
///
/// The reply function receives the zero-based call index and the rendered
/// prompt, so tests can fail specific calls or vary output per call.
#[derive(Clone)]
pub struct MockBackend {
    reply: Arc<ReplyFn>,
    calls: Arc<AtomicUsize>,
    kind: BackendKind,
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("calls", &self.calls.load(Ordering::SeqCst))
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl MockBackend {
    /// Backend whose reply is computed by `f` from (call index, prompt).
    #[must_use]
    pub fn with<F>(f: F) -> Self
    where
        F: Fn(usize, &str) -> InferenceResult<String> + Send + Sync + 'static,
    {
        Self {
            reply: Arc::new(f),
            calls: Arc::new(AtomicUsize::new(0)),
            kind: BackendKind::Remote,
        }
    }

    /// Backend that returns the same text for every call.
    #[must_use]
    pub fn fixed(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::with(move |_, _| Ok(reply.clone()))
    }

    /// Backend that succeeds with `reply` except on the given zero-based
    /// call index, which fails with an API error.
    #[must_use]
    pub fn failing_at(index: usize, reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::with(move |call, _| {
            if call == index {
                Err(InferenceError::Api("scripted failure".to_string()))
            } else {
                Ok(reply.clone())
            }
        })
    }

    /// Override the advertised backend kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: BackendKind) -> Self {
        self.kind = kind;
        self
    }

    /// Number of completion calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn complete(&self, prompt: &str) -> InferenceResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.reply)(call, prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_replies_and_counts() {
        let backend = MockBackend::fixed("summary");
        assert_eq!(backend.complete("a").await.unwrap(), "summary");
        assert_eq!(backend.complete("b").await.unwrap(), "summary");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn failing_at_fails_only_that_call() {
        let backend = MockBackend::failing_at(1, "ok");
        assert!(backend.complete("a").await.is_ok());
        assert!(backend.complete("b").await.is_err());
        assert!(backend.complete("c").await.is_ok());
    }

    #[tokio::test]
    async fn reply_sees_prompt() {
        let backend = MockBackend::with(|_, prompt| Ok(format!("len={}", prompt.len())));
        assert_eq!(backend.complete("1234").await.unwrap(), "len=4");
    }
}
