// src/pipeline/mod.rs
//! Entry ingestion pipeline
//!
//! Orchestrates one submission end to end: validate, estimate duration,
//! transcribe, persist, then hand enrichment and achievement evaluation to
//! background tasks. The call returns as soon as the entry exists; a failed
//! enrichment degrades the entry but never rolls it back.

use std::sync::Arc;

use log::{error, info};
use uuid::Uuid;

use crate::achievements::{AchievementEngine, TriggerAction};
use crate::config::IngestionConfig;
use crate::error::{IngestionError, ValidationError};
use crate::insight::InsightGenerator;
use crate::repository::{Entry, EntryRepository, EntryUpdate, NewEntry, RepositoryManager};
use crate::services::traits::SpeechToTextService;

/// One raw audio upload. Lives only for the duration of a single `ingest`
/// call.
#[derive(Debug, Clone)]
pub struct AudioSubmission {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioSubmission {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// Ingestion pipeline over the entry repository and the external services
pub struct IngestionPipeline<R: RepositoryManager> {
    repos: Arc<R>,
    speech: Arc<dyn SpeechToTextService>,
    insights: Arc<InsightGenerator>,
    achievements: AchievementEngine<R>,
    config: IngestionConfig,
}

impl<R: RepositoryManager + 'static> IngestionPipeline<R> {
    pub fn new(
        repos: Arc<R>,
        speech: Arc<dyn SpeechToTextService>,
        insights: Arc<InsightGenerator>,
        achievements: AchievementEngine<R>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            repos,
            speech,
            insights,
            achievements,
            config,
        }
    }

    /// Ingest one audio submission for a user.
    ///
    /// Validation and transcription failures abort the call with nothing
    /// persisted. Once the entry is written it is returned immediately;
    /// tag/insight enrichment and achievement evaluation continue in the
    /// background and their failures are only logged.
    pub async fn ingest(
        &self,
        submission: AudioSubmission,
        user_id: Uuid,
    ) -> Result<Entry, IngestionError> {
        self.validate(&submission)?;

        let duration_secs =
            estimated_duration_secs(submission.bytes.len(), self.config.assumed_bitrate_bps);

        let transcript = self
            .speech
            .transcribe(&submission.bytes, &submission.mime_type)
            .await?;

        let entry = self
            .repos
            .entries()
            .create(&NewEntry {
                user_id,
                audio_url: format!("audio://entries/{}", Uuid::new_v4()),
                transcript: Some(transcript),
                duration_secs,
            })
            .await
            .map_err(IngestionError::Repository)?;

        info!(
            "created entry {} for user {} ({}s of audio)",
            entry.id, user_id, duration_secs
        );

        self.spawn_enrichment(&entry);
        self.achievements.dispatch(user_id, TriggerAction::EntryCreated);

        Ok(entry)
    }

    fn validate(&self, submission: &AudioSubmission) -> Result<(), ValidationError> {
        if submission.bytes.is_empty() {
            return Err(ValidationError::EmptyAudio);
        }
        let size = submission.bytes.len() as u64;
        if size > self.config.max_audio_bytes {
            return Err(ValidationError::TooLarge {
                size,
                limit: self.config.max_audio_bytes,
            });
        }

        let mime = normalize_mime(&submission.mime_type);
        if !self
            .config
            .allowed_mime_types
            .iter()
            .any(|allowed| allowed == &mime)
        {
            return Err(ValidationError::UnsupportedMimeType(
                submission.mime_type.clone(),
            ));
        }

        Ok(())
    }

    /// Run tag and content-analysis enrichment off the response path. A
    /// successful analysis write additionally triggers emotion-analysis
    /// achievement evaluation.
    fn spawn_enrichment(&self, entry: &Entry) {
        let transcript = match &entry.transcript {
            Some(transcript) => transcript.clone(),
            None => return,
        };
        let repos = Arc::clone(&self.repos);
        let insights = Arc::clone(&self.insights);
        let engine = self.achievements.clone();
        let entry_id = entry.id;
        let user_id = entry.user_id;

        tokio::spawn(async move {
            let tags = insights.generate_tags(&transcript).await;
            let analysis = insights.analyze_content(&transcript).await;
            let analyzed = analysis.is_some();

            let updates = EntryUpdate {
                tags: Some(tags),
                ai_analysis: analysis,
            };
            match repos.entries().update(&entry_id, &updates).await {
                Ok(_) => {
                    info!("enriched entry {}", entry_id);
                    if analyzed {
                        engine.evaluate(user_id, TriggerAction::EmotionAnalyzed).await;
                    }
                }
                Err(e) => error!("failed to persist enrichment for entry {}: {:#}", entry_id, e),
            }
        });
    }
}

/// Estimate entry duration from payload size at a fixed assumed bitrate.
/// This is an approximation: recordings encoded at another or a variable
/// bitrate will drift from the real decoded length.
pub(crate) fn estimated_duration_secs(byte_len: usize, bitrate_bps: u64) -> i64 {
    let bits = byte_len as u64 * 8;
    ((bits + bitrate_bps - 1) / bitrate_bps) as i64
}

/// Strip codec parameters from a mime type, e.g. `audio/webm;codecs=opus`
fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}
