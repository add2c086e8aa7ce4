// src/services/traits.rs
//! Service layer trait definitions
//!
//! External collaborators reached over HTTP sit behind these traits so the
//! pipeline can be exercised against stubs. Production wiring plugs in the
//! Whisper and Ollama clients from this module's siblings.

use anyhow::Result;
use async_trait::async_trait;

use crate::error::TranscriptionError;

/// Speech-to-text service for converting raw audio into a transcript
#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribe an audio payload. Errors distinguish a format the service
    /// rejected from a transport or availability failure.
    async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<String, TranscriptionError>;
}

/// Text-insight service backed by an LLM
#[async_trait]
pub trait TextInsightService: Send + Sync {
    /// Generate a completion for the given prompt. Parsing and shape
    /// validation of the model output stay with the caller.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
