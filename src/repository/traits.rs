// src/repository/traits.rs
//! Repository trait definitions for data access layer abstraction
//!
//! This module defines the data models and the repository traits the core
//! depends on. The embedding application provides the durable implementations;
//! [`super::memory`] provides an in-memory one for tests and local use.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A journal entry. Created by the ingestion pipeline once transcription
/// succeeds; tags and analysis are filled in by the enrichment pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Opaque handle to the stored audio. Blob storage and reference
    /// encryption belong to the embedding layer.
    pub audio_url: String,
    pub transcript: Option<String>,
    /// Estimated from payload size at an assumed bitrate, immutable once set
    pub duration_secs: i64,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub ai_analysis: Option<AiAnalysis>,
}

/// AI analysis block attached to an entry after enrichment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnalysis {
    /// Sentiment score, always within 1..=5
    pub sentiment: i32,
    /// Up to three topics
    pub topics: Vec<String>,
    /// Up to three insights
    pub insights: Vec<String>,
}

/// New entry data for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntry {
    pub user_id: Uuid,
    pub audio_url: String,
    pub transcript: Option<String>,
    pub duration_secs: i64,
}

/// Partial entry update applied by the enrichment pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryUpdate {
    pub tags: Option<Vec<String>>,
    pub ai_analysis: Option<AiAnalysis>,
}

/// Unlocking rule of an achievement. Closed set: adding a kind is a
/// compile-time extension point, every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AchievementCriteria {
    /// Total entries recorded by the user
    EntryCount { target: u32 },
    /// Consecutive calendar days with at least one entry, ending today
    Streak { target: u32 },
    /// Entries carrying a sentiment analysis
    EmotionAnalysis { target: u32 },
}

impl AchievementCriteria {
    pub fn target(&self) -> u32 {
        match self {
            AchievementCriteria::EntryCount { target } => *target,
            AchievementCriteria::Streak { target } => *target,
            AchievementCriteria::EmotionAnalysis { target } => *target,
        }
    }
}

/// Immutable achievement reference data, owned by the embedding application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub criteria: AchievementCriteria,
}

/// Per-user progress towards one achievement. `earned_at` is terminal: once
/// set it is never overwritten or cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievementProgress {
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub current: i64,
    pub target: i64,
    /// Always within 0.0..=100.0
    pub percent: f32,
    pub earned_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl UserAchievementProgress {
    pub fn is_earned(&self) -> bool {
        self.earned_at.is_some()
    }
}

// Repository trait definitions

/// Entry repository trait for journal entries
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Create a new entry
    async fn create(&self, entry: &NewEntry) -> Result<Entry>;

    /// Apply a partial update to an entry
    async fn update(&self, id: &Uuid, updates: &EntryUpdate) -> Result<Entry>;

    /// Find an entry by ID
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Entry>>;

    /// All entries of a user, oldest first
    async fn find_all_by_user(&self, user_id: &Uuid) -> Result<Vec<Entry>>;

    /// Total entry count for a user
    async fn count_by_user(&self, user_id: &Uuid) -> Result<i64>;
}

/// Achievement definition repository trait (static reference data)
#[async_trait]
pub trait AchievementDefinitionRepository: Send + Sync {
    /// All achievement definitions
    async fn find_all(&self) -> Result<Vec<AchievementDefinition>>;
}

/// User progress repository trait
#[async_trait]
pub trait UserProgressRepository: Send + Sync {
    /// Find the progress row for a (user, achievement) pair
    async fn find(
        &self,
        user_id: &Uuid,
        achievement_id: &Uuid,
    ) -> Result<Option<UserAchievementProgress>>;

    /// Insert or update a progress row. Implementations must preserve an
    /// already-set `earned_at` regardless of the incoming value.
    async fn upsert(&self, progress: &UserAchievementProgress) -> Result<UserAchievementProgress>;

    /// All progress rows of a user
    async fn find_all_by_user(&self, user_id: &Uuid) -> Result<Vec<UserAchievementProgress>>;
}
