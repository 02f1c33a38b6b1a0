//! End-to-end pipeline scenarios with realistic transcript sizes.

use async_trait::async_trait;
use brevis::prelude::*;
use std::path::Path;
use std::sync::Arc;

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
            duration: Some(12.5),
            language: Some("en".to_string()),
        })
    }

    async fn transcribe_bytes(&self, _data: &[u8], _filename: &str) -> TranscribeResult<Transcript> {
        self.transcribe(Path::new("")).await
    }
}

/// Build a transcript of roughly `target_chars` characters made of short
/// paragraphs, so the chunker has natural boundaries to work with.
fn paragraphs(target_chars: usize) -> String {
    let sentence = "The speaker keeps talking about the quarterly planning meeting. ";
    let mut text = String::new();
    while text.len() < target_chars {
        for _ in 0..4 {
            text.push_str(sentence);
        }
        text.push_str("\n\n");
    }
    text.truncate(target_chars);
    text
}

/// Collect every `segmentNN` marker in `text`, in order of appearance.
fn markers_in(text: &str) -> Vec<String> {
    text.match_indices("segment")
        .map(|(start, _)| text[start..start + 9].to_string())
        .collect()
}

fn pipeline(backend: MockBackend, transcript: String, token_budget: usize) -> SummaryPipeline {
    SummaryPipeline::builder()
        .backend(Arc::new(backend))
        .transcriber(Arc::new(FixedTranscriber(transcript)))
        .config(PipelineConfig {
            token_budget,
            ..PipelineConfig::default()
        })
        .build()
}

#[tokio::test]
async fn short_transcript_is_one_backend_call() {
    // 500 chars against a 16000-char budget: direct path, exactly one call.
    let backend = MockBackend::fixed("short summary");
    let counter = backend.clone();
    let pipeline = pipeline(backend, paragraphs(500), 4000);

    let result = pipeline.run(Path::new("voice.ogg")).await.unwrap();
    assert_eq!(result.summary, "short summary");
    assert_eq!(result.full_text.len(), 500);
    assert_eq!(counter.call_count(), 1);
}

#[tokio::test]
async fn long_transcript_goes_through_map_reduce() {
    // 50000 chars against a 16000-char budget: at least 3 chunks, one map
    // call per chunk, then one combine call (summaries are tiny, so the
    // reduction finishes in a single level).
    let text = paragraphs(50_000);
    let chunk_count = split_text(&text, 4000 * CHARS_PER_TOKEN).len();
    assert!(chunk_count >= 3);

    let backend = MockBackend::fixed("partial summary");
    let counter = backend.clone();
    let pipeline = pipeline(backend, text, 4000);

    let result = pipeline.run(Path::new("voice.ogg")).await.unwrap();
    assert_eq!(result.summary, "partial summary");
    assert_eq!(counter.call_count(), chunk_count + 1);
}

#[tokio::test]
async fn map_phase_failure_discards_partial_summaries() {
    // The second of the map calls fails: the invocation fails as a whole
    // and nothing from the successful first chunk leaks out.
    let text = paragraphs(50_000);
    let backend = MockBackend::failing_at(1, "partial summary");
    let pipeline = pipeline(backend, text, 4000);

    let err = pipeline.run(Path::new("voice.ogg")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Inference(_)));
}

#[tokio::test]
async fn map_partials_reach_combine_in_chunk_order() {
    use std::sync::Mutex;

    // Eight paragraphs, each just under the chunk bound and opening with a
    // unique marker, so every paragraph becomes its own chunk.
    let mut text = String::new();
    for i in 0..8 {
        text.push_str(&format!("segment{i:02} "));
        text.push_str(&"talk ".repeat(380));
        text.push_str("\n\n");
    }
    assert_eq!(split_text(&text, 2000).len(), 8);

    // Map replies echo their chunk's marker; the combine call is the only
    // prompt carrying more than one marker and gets captured for inspection.
    let combine_prompt: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let captured = Arc::clone(&combine_prompt);
    let backend = MockBackend::with(move |_, prompt| {
        let markers = markers_in(prompt);
        if markers.len() > 1 {
            *captured.lock().unwrap() = Some(prompt.to_string());
            Ok("combined".to_string())
        } else {
            Ok(markers[0].clone())
        }
    });

    let pipeline = SummaryPipeline::builder()
        .backend(Arc::new(backend))
        .transcriber(Arc::new(FixedTranscriber(text)))
        .config(PipelineConfig {
            max_chunk_chars: Some(2000),
            ..PipelineConfig::default()
        })
        .build();

    let result = pipeline.run(Path::new("voice.ogg")).await.unwrap();
    assert_eq!(result.summary, "combined");

    // Concurrent map calls may finish in any order; the partials handed to
    // the combine step must still follow the original chunk order.
    let prompt = combine_prompt.lock().unwrap().clone().unwrap();
    let expected: Vec<String> = (0..8).map(|i| format!("segment{i:02}")).collect();
    assert_eq!(markers_in(&prompt), expected);
}

#[tokio::test]
async fn many_partials_reduce_in_bounded_levels() {
    // Summaries shrink by a large factor each level, so even a transcript
    // that maps to dozens of chunks reduces in very few levels.
    let text = paragraphs(200_000);
    let chunk_count = split_text(&text, 1000).len();
    assert!(chunk_count > 50);

    let backend = MockBackend::fixed("condensed");
    let counter = backend.clone();
    let pipeline = SummaryPipeline::builder()
        .backend(Arc::new(backend))
        .transcriber(Arc::new(FixedTranscriber(text)))
        .config(PipelineConfig {
            max_chunk_chars: Some(1000),
            ..PipelineConfig::default()
        })
        .build();

    let result = pipeline.run(Path::new("voice.ogg")).await.unwrap();
    assert_eq!(result.summary, "condensed");
    // O(n) total calls: the map phase dominates, reduction adds a small tail.
    assert!(counter.call_count() < chunk_count * 2);
}

#[tokio::test]
async fn pipeline_is_reusable_across_invocations() {
    let backend = MockBackend::fixed("summary");
    let pipeline = Arc::new(pipeline(backend, paragraphs(500), 4000));

    let a = Arc::clone(&pipeline);
    let b = Arc::clone(&pipeline);
    let (ra, rb) = tokio::join!(
        a.run(Path::new("one.ogg")),
        b.run(Path::new("two.ogg")),
    );
    assert!(ra.is_ok());
    assert!(rb.is_ok());
}
