//! Audio transcription collaborator.
//!
//! Transcription is a black box from the pipeline's point of view: audio in,
//! [`Transcript`] out. The [`Transcriber`] trait is the seam; the shipped
//! implementation calls the OpenAI Whisper API.

mod provider;
mod whisper;

pub use provider::{
    AudioFormat, TranscribeResult, Transcriber, Transcript, TranscriptionError,
};
pub use whisper::WhisperTranscriber;
