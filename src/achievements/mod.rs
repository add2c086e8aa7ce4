// src/achievements/mod.rs
//! Achievement engine
//!
//! Evaluates every achievement definition against a user's durable state
//! whenever a triggering action occurs. Progress is always recomputed from
//! source counts, never incremented, and an earned achievement is terminal:
//! once `earned_at` is set no evaluation touches that pair again.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::streak;
use crate::repository::{
    AchievementCriteria, AchievementDefinition, AchievementDefinitionRepository, EntryRepository,
    RepositoryManager, UserAchievementProgress, UserProgressRepository,
};

/// Action that triggers an evaluation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerAction {
    EntryCreated,
    EmotionAnalyzed,
}

/// Per-user achievement evaluation over the repositories
pub struct AchievementEngine<R: RepositoryManager> {
    repos: Arc<R>,
}

impl<R: RepositoryManager> Clone for AchievementEngine<R> {
    fn clone(&self) -> Self {
        Self {
            repos: Arc::clone(&self.repos),
        }
    }
}

impl<R: RepositoryManager + 'static> AchievementEngine<R> {
    pub fn new(repos: Arc<R>) -> Self {
        Self { repos }
    }

    /// Fire-and-forget form of [`evaluate`](Self::evaluate): schedules the
    /// pass on a background task. Errors end up in the log, never at the
    /// caller.
    pub fn dispatch(&self, user_id: Uuid, action: TriggerAction) {
        let engine = self.clone();
        tokio::spawn(async move {
            engine.evaluate(user_id, action).await;
        });
    }

    /// Evaluate all achievement definitions for a user. A failure on one
    /// definition is logged and does not abort the remaining ones.
    pub async fn evaluate(&self, user_id: Uuid, action: TriggerAction) {
        let definitions = match self.repos.achievement_definitions().find_all().await {
            Ok(definitions) => definitions,
            Err(e) => {
                error!("failed to load achievement definitions: {:#}", e);
                return;
            }
        };

        let now = Utc::now();
        for definition in &definitions {
            if let Err(e) = self
                .evaluate_definition(user_id, definition, action, now)
                .await
            {
                error!(
                    "evaluation of achievement '{}' failed for user {}: {:#}",
                    definition.name, user_id, e
                );
            }
        }
    }

    async fn evaluate_definition(
        &self,
        user_id: Uuid,
        definition: &AchievementDefinition,
        action: TriggerAction,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let existing = self
            .repos
            .user_progress()
            .find(&user_id, &definition.id)
            .await
            .context("failed to load progress")?;

        // Earned is terminal. No recomputation, no writes.
        if let Some(progress) = &existing {
            if progress.is_earned() {
                return Ok(());
            }
        }

        let current = match self
            .current_value(user_id, &definition.criteria, action)
            .await?
        {
            Some(current) => current.max(0),
            // The action is irrelevant to this criteria kind; skip the
            // definition entirely this cycle.
            None => return Ok(()),
        };

        let target = i64::from(definition.criteria.target());
        let percent = if target <= 0 {
            100.0
        } else {
            ((current as f64 / target as f64) * 100.0).min(100.0)
        };
        let earned_at = if percent >= 100.0 { Some(now) } else { None };

        let progress = UserAchievementProgress {
            user_id,
            achievement_id: definition.id,
            current,
            target,
            percent: percent as f32,
            earned_at,
            updated_at: now,
        };
        self.repos
            .user_progress()
            .upsert(&progress)
            .await
            .context("failed to write progress")?;

        if earned_at.is_some() {
            info!("user {} earned achievement '{}'", user_id, definition.name);
        }

        Ok(())
    }

    /// Current source-derived value for a criteria kind, or `None` when the
    /// triggering action is irrelevant to it.
    async fn current_value(
        &self,
        user_id: Uuid,
        criteria: &AchievementCriteria,
        action: TriggerAction,
    ) -> Result<Option<i64>> {
        match criteria {
            AchievementCriteria::EntryCount { .. } => {
                if action != TriggerAction::EntryCreated {
                    return Ok(None);
                }
                let count = self.repos.entries().count_by_user(&user_id).await?;
                Ok(Some(count))
            }
            AchievementCriteria::Streak { target } => {
                let entries = self.repos.entries().find_all_by_user(&user_id).await?;
                let days = streak::entry_day_set(&entries);
                let streak_days =
                    streak::streak_ending_on(&days, Utc::now().date_naive(), Some(*target));
                Ok(Some(i64::from(streak_days)))
            }
            AchievementCriteria::EmotionAnalysis { .. } => {
                if action != TriggerAction::EmotionAnalyzed {
                    return Ok(None);
                }
                let entries = self.repos.entries().find_all_by_user(&user_id).await?;
                let analyzed = entries.iter().filter(|e| e.ai_analysis.is_some()).count();
                Ok(Some(analyzed as i64))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{AiAnalysis, Entry, MemoryRepositoryManager};
    use chrono::Duration;

    fn definition(criteria: AchievementCriteria) -> AchievementDefinition {
        AchievementDefinition {
            id: Uuid::new_v4(),
            name: "test achievement".to_string(),
            description: "for tests".to_string(),
            icon: None,
            criteria,
        }
    }

    fn entry_days_ago(user_id: Uuid, days: i64, analyzed: bool) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            user_id,
            audio_url: "audio://entries/fixture".to_string(),
            transcript: Some("fixture transcript".to_string()),
            duration_secs: 30,
            created_at: Utc::now() - Duration::days(days),
            tags: Vec::new(),
            ai_analysis: if analyzed {
                Some(AiAnalysis {
                    sentiment: 4,
                    topics: vec!["fixture".to_string()],
                    insights: Vec::new(),
                })
            } else {
                None
            },
        }
    }

    async fn engine_with(
        definitions: Vec<AchievementDefinition>,
    ) -> (AchievementEngine<MemoryRepositoryManager>, Arc<MemoryRepositoryManager>) {
        let repos = Arc::new(MemoryRepositoryManager::new());
        for definition in definitions {
            repos.achievement_definitions().insert(definition).await;
        }
        (AchievementEngine::new(Arc::clone(&repos)), repos)
    }

    #[tokio::test]
    async fn entry_count_progress_and_earning() {
        let def = definition(AchievementCriteria::EntryCount { target: 2 });
        let def_id = def.id;
        let (engine, repos) = engine_with(vec![def]).await;
        let user_id = Uuid::new_v4();

        repos.entries().insert(entry_days_ago(user_id, 0, false)).await;
        engine.evaluate(user_id, TriggerAction::EntryCreated).await;

        let progress = repos
            .user_progress()
            .find(&user_id, &def_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(progress.current, 1);
        assert_eq!(progress.percent, 50.0);
        assert!(!progress.is_earned());

        repos.entries().insert(entry_days_ago(user_id, 0, false)).await;
        engine.evaluate(user_id, TriggerAction::EntryCreated).await;

        let progress = repos
            .user_progress()
            .find(&user_id, &def_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(progress.percent, 100.0);
        assert!(progress.is_earned());
    }

    #[tokio::test]
    async fn evaluation_is_idempotent() {
        let def = definition(AchievementCriteria::EntryCount { target: 5 });
        let def_id = def.id;
        let (engine, repos) = engine_with(vec![def]).await;
        let user_id = Uuid::new_v4();

        repos.entries().insert(entry_days_ago(user_id, 0, false)).await;
        engine.evaluate(user_id, TriggerAction::EntryCreated).await;
        let first = repos
            .user_progress()
            .find(&user_id, &def_id)
            .await
            .unwrap()
            .unwrap();

        engine.evaluate(user_id, TriggerAction::EntryCreated).await;
        let second = repos
            .user_progress()
            .find(&user_id, &def_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.percent, second.percent);
        assert_eq!(first.earned_at, second.earned_at);
    }

    #[tokio::test]
    async fn earned_achievements_stay_earned() {
        let def = definition(AchievementCriteria::Streak { target: 2 });
        let def_id = def.id;
        let (engine, repos) = engine_with(vec![def]).await;
        let user_id = Uuid::new_v4();

        repos.entries().insert(entry_days_ago(user_id, 0, false)).await;
        repos.entries().insert(entry_days_ago(user_id, 1, false)).await;
        engine.evaluate(user_id, TriggerAction::EntryCreated).await;

        let earned = repos
            .user_progress()
            .find(&user_id, &def_id)
            .await
            .unwrap()
            .unwrap();
        let earned_at = earned.earned_at.unwrap();

        // Re-evaluating later, even against a state where the streak would
        // compute lower, must not clear the timestamp.
        engine.evaluate(user_id, TriggerAction::EntryCreated).await;
        let after = repos
            .user_progress()
            .find(&user_id, &def_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.earned_at, Some(earned_at));
    }

    #[tokio::test]
    async fn irrelevant_actions_are_skipped() {
        let def = definition(AchievementCriteria::EntryCount { target: 1 });
        let def_id = def.id;
        let (engine, repos) = engine_with(vec![def]).await;
        let user_id = Uuid::new_v4();

        repos.entries().insert(entry_days_ago(user_id, 0, true)).await;
        engine.evaluate(user_id, TriggerAction::EmotionAnalyzed).await;

        // No progress row was written at all for the irrelevant action.
        assert!(repos
            .user_progress()
            .find(&user_id, &def_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn emotion_analysis_counts_analyzed_entries() {
        let def = definition(AchievementCriteria::EmotionAnalysis { target: 2 });
        let def_id = def.id;
        let (engine, repos) = engine_with(vec![def]).await;
        let user_id = Uuid::new_v4();

        repos.entries().insert(entry_days_ago(user_id, 0, true)).await;
        repos.entries().insert(entry_days_ago(user_id, 1, false)).await;
        engine.evaluate(user_id, TriggerAction::EmotionAnalyzed).await;

        let progress = repos
            .user_progress()
            .find(&user_id, &def_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(progress.current, 1);
        assert!(!progress.is_earned());
    }

    #[tokio::test]
    async fn streak_is_capped_at_target() {
        let def = definition(AchievementCriteria::Streak { target: 3 });
        let def_id = def.id;
        let (engine, repos) = engine_with(vec![def]).await;
        let user_id = Uuid::new_v4();

        for days in 0..5 {
            repos.entries().insert(entry_days_ago(user_id, days, false)).await;
        }
        engine.evaluate(user_id, TriggerAction::EntryCreated).await;

        let progress = repos
            .user_progress()
            .find(&user_id, &def_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(progress.current, 3);
        assert!(progress.is_earned());
    }
}
