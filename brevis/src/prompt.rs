//! Prompt templates keyed by backend kind.
//!
//! Remote instruction-tuned models and local chat models want differently
//! phrased prompts. The wording for every pipeline stage is fixed per backend
//! at construction time through one lookup table, never re-decided per call.

use serde::{Deserialize, Serialize};

/// Which language-model implementation and prompt wording to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hosted API (OpenAI-compatible), instruction-style prompts.
    #[default]
    Remote,
    /// Local inference server (Ollama), dialogue-style prompts.
    Local,
}

impl BackendKind {
    /// Stable name for logging and config display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

/// A parameterized prompt with a single `{text}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: &'static str,
}

/// Slot marker substituted by [`PromptTemplate::render`].
const TEXT_SLOT: &str = "{text}";

impl PromptTemplate {
    /// Create a template. The wording must contain exactly one `{text}` slot.
    #[must_use]
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// Render the template with `text` substituted into the slot.
    #[must_use]
    pub fn render(&self, text: &str) -> String {
        self.template.replacen(TEXT_SLOT, text, 1)
    }
}

/// The three prompt wordings a pipeline needs: one for single-call
/// summarization, one for the map phase, one for the combine step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Used when the whole transcript fits in one call.
    pub single: PromptTemplate,
    /// Used for each chunk during the map phase.
    pub map: PromptTemplate,
    /// Used to combine partial summaries during reduction.
    pub combine: PromptTemplate,
}

impl PromptSet {
    /// Built-in prompt set for the given backend kind.
    #[must_use]
    pub const fn builtin(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Remote => Self {
                single: PromptTemplate::new(REMOTE_SINGLE),
                map: PromptTemplate::new(REMOTE_MAP),
                combine: PromptTemplate::new(REMOTE_COMBINE),
            },
            BackendKind::Local => Self {
                single: PromptTemplate::new(LOCAL_SINGLE),
                map: PromptTemplate::new(LOCAL_MAP),
                combine: PromptTemplate::new(LOCAL_COMBINE),
            },
        }
    }
}

const REMOTE_SINGLE: &str = "\
The following text is a transcribed voice message or audio file.
Write a summary of it in the same language as the text.
It is important to keep as much information as possible.
If questions are asked, return these questions.
If possible, make a bullet point summary.
Here comes the text:
{text}";

const REMOTE_MAP: &str = "\
The following text is a part of a transcribed voice message or audio file.
Write a summary of it in the same language as the text.
It is important to keep as much information as possible.
Here comes the text:
\"{text}\"
SUMMARY:";

const REMOTE_COMBINE: &str = "\
Write a summary of the following text, which consists of summaries of parts
of a transcribed voice message or audio file. Summarize in the same language
as the text. It is important to keep as much information as possible.
Here comes the text:
\"{text}\"
SUMMARY:";

const LOCAL_SINGLE: &str = "\
You are an assistant that summarizes transcribed voice messages.
Reply with a summary in the same language as the message, keeping as much
information as possible. If the message asks questions, repeat them.
Prefer bullet points.

Message:
{text}

Summary:";

const LOCAL_MAP: &str = "\
You are an assistant that summarizes transcribed voice messages.
The following is one part of a longer message. Reply with a summary of this
part in the same language, keeping as much information as possible.

Part:
{text}

Summary:";

const LOCAL_COMBINE: &str = "\
You are an assistant that summarizes transcribed voice messages.
The following are summaries of parts of one message. Reply with a single
combined summary in the same language, keeping as much information as
possible.

Summaries:
{text}

Summary:";
