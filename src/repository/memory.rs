// src/repository/memory.rs
//! In-memory repository implementation
//!
//! Backs the test suite and local development. State lives in `RwLock`ed
//! maps; every method clones out of the lock so callers never hold a guard.

use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::{
    AchievementDefinition, AchievementDefinitionRepository, Entry, EntryRepository, EntryUpdate,
    NewEntry, UserAchievementProgress, UserProgressRepository,
};
use super::RepositoryManager;

/// In-memory entry repository
#[derive(Default)]
pub struct MemoryEntryRepository {
    rows: RwLock<HashMap<Uuid, Entry>>,
}

impl MemoryEntryRepository {
    /// Seed a fully-formed entry, bypassing `create` defaults. Used by
    /// fixtures that need historical timestamps or pre-set analysis.
    pub async fn insert(&self, entry: Entry) {
        self.rows.write().await.insert(entry.id, entry);
    }
}

#[async_trait]
impl EntryRepository for MemoryEntryRepository {
    async fn create(&self, entry: &NewEntry) -> Result<Entry> {
        let row = Entry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            audio_url: entry.audio_url.clone(),
            transcript: entry.transcript.clone(),
            duration_secs: entry.duration_secs,
            created_at: Utc::now(),
            tags: Vec::new(),
            ai_analysis: None,
        };
        self.rows.write().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: &Uuid, updates: &EntryUpdate) -> Result<Entry> {
        let mut rows = self.rows.write().await;
        let row = match rows.get_mut(id) {
            Some(row) => row,
            None => bail!("entry {} not found", id),
        };
        if let Some(tags) = &updates.tags {
            row.tags = tags.clone();
        }
        if let Some(analysis) = &updates.ai_analysis {
            row.ai_analysis = Some(analysis.clone());
        }
        Ok(row.clone())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Entry>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_all_by_user(&self, user_id: &Uuid) -> Result<Vec<Entry>> {
        let mut entries: Vec<Entry> = self
            .rows
            .read()
            .await
            .values()
            .filter(|e| e.user_id == *user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    async fn count_by_user(&self, user_id: &Uuid) -> Result<i64> {
        let count = self
            .rows
            .read()
            .await
            .values()
            .filter(|e| e.user_id == *user_id)
            .count();
        Ok(count as i64)
    }
}

/// In-memory achievement definition repository
#[derive(Default)]
pub struct MemoryAchievementDefinitionRepository {
    rows: RwLock<Vec<AchievementDefinition>>,
}

impl MemoryAchievementDefinitionRepository {
    /// Register a definition. Reference data is otherwise immutable.
    pub async fn insert(&self, definition: AchievementDefinition) {
        self.rows.write().await.push(definition);
    }
}

#[async_trait]
impl AchievementDefinitionRepository for MemoryAchievementDefinitionRepository {
    async fn find_all(&self) -> Result<Vec<AchievementDefinition>> {
        Ok(self.rows.read().await.clone())
    }
}

/// In-memory user progress repository
#[derive(Default)]
pub struct MemoryUserProgressRepository {
    rows: RwLock<HashMap<(Uuid, Uuid), UserAchievementProgress>>,
}

#[async_trait]
impl UserProgressRepository for MemoryUserProgressRepository {
    async fn find(
        &self,
        user_id: &Uuid,
        achievement_id: &Uuid,
    ) -> Result<Option<UserAchievementProgress>> {
        Ok(self
            .rows
            .read()
            .await
            .get(&(*user_id, *achievement_id))
            .cloned())
    }

    async fn upsert(&self, progress: &UserAchievementProgress) -> Result<UserAchievementProgress> {
        let key = (progress.user_id, progress.achievement_id);
        let mut rows = self.rows.write().await;
        let mut row = progress.clone();
        // earned_at is terminal: an existing timestamp survives whatever the
        // caller passes in.
        if let Some(existing) = rows.get(&key) {
            if existing.earned_at.is_some() {
                row.earned_at = existing.earned_at;
            }
        }
        rows.insert(key, row.clone());
        Ok(row)
    }

    async fn find_all_by_user(&self, user_id: &Uuid) -> Result<Vec<UserAchievementProgress>> {
        let mut rows: Vec<UserAchievementProgress> = self
            .rows
            .read()
            .await
            .values()
            .filter(|p| p.user_id == *user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.achievement_id);
        Ok(rows)
    }
}

/// In-memory repository manager
#[derive(Default)]
pub struct MemoryRepositoryManager {
    entries: MemoryEntryRepository,
    definitions: MemoryAchievementDefinitionRepository,
    progress: MemoryUserProgressRepository,
}

impl MemoryRepositoryManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryManager for MemoryRepositoryManager {
    type EntryRepo = MemoryEntryRepository;
    type DefinitionRepo = MemoryAchievementDefinitionRepository;
    type ProgressRepo = MemoryUserProgressRepository;

    fn entries(&self) -> &Self::EntryRepo {
        &self.entries
    }

    fn achievement_definitions(&self) -> &Self::DefinitionRepo {
        &self.definitions
    }

    fn user_progress(&self) -> &Self::ProgressRepo {
        &self.progress
    }
}
