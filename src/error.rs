// src/error.rs
//! Error taxonomy for the ingestion path.
//!
//! Only validation and transcription failures are visible to the caller of
//! `ingest`; enrichment and achievement evaluation absorb their own errors
//! and degrade the result instead of failing the request.

use thiserror::Error;

/// Input rejection before any external call or write happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("audio payload is empty")]
    EmptyAudio,

    #[error("audio payload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("unsupported audio mime type: {0}")]
    UnsupportedMimeType(String),
}

/// Speech-to-text failure. The two variants map to different HTTP classes in
/// the embedding layer: `UnsupportedFormat` is client-fixable (400-class),
/// `Unavailable` is transient (5xx-class, retryable by the caller).
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("audio format rejected by the speech service: {0}")]
    UnsupportedFormat(String),

    #[error("speech service unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a single `ingest` call. Nothing has been persisted unless the
/// variant is `Repository`, which can only occur after transcription
/// succeeded and the entry insert itself failed.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("invalid audio submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("failed to persist entry: {0}")]
    Repository(#[from] anyhow::Error),
}

impl IngestionError {
    /// Whether the failure is the caller's to fix (400-class) rather than a
    /// transient or internal fault (5xx-class).
    pub fn is_client_error(&self) -> bool {
        match self {
            IngestionError::Validation(_) => true,
            IngestionError::Transcription(TranscriptionError::UnsupportedFormat(_)) => true,
            IngestionError::Transcription(TranscriptionError::Unavailable(_)) => false,
            IngestionError::Repository(_) => false,
        }
    }
}
