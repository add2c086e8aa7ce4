// src/analytics/mod.rs
//! Pattern analytics aggregator
//!
//! Stateless, read-only aggregation over a user's history: journaling
//! consistency, emotional trends, topic trends and rule-based
//! recommendations. Everything is recomputed per request and nothing is
//! persisted. Users with no or little history get well-formed defaults.

pub mod streak;
pub mod trends;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AnalyticsConfig;
use crate::repository::{Entry, EntryRepository, RepositoryManager};

/// Full derived view over a user's journaling history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub consistency: ConsistencyMetrics,
    pub emotional_trends: EmotionalTrends,
    pub topics: TopicTrends,
    pub recommendations: Vec<String>,
}

/// Journaling cadence metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyMetrics {
    /// Consecutive days with an entry, ending today
    pub streak_days: u32,
    pub total_entries: usize,
    pub avg_entries_per_week: f64,
    /// Weekday with the most entries historically, `None` without entries
    pub most_active_day: Option<String>,
    /// Fraction of the current calendar month's days with at least one entry
    pub completion_rate: f64,
}

/// One point of the mood progression: the mean sentiment of a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodPoint {
    pub date: NaiveDate,
    pub sentiment: f64,
}

/// Sentiment series metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionalTrends {
    pub dominant_emotion: Option<String>,
    /// `1 / (1 + variance)` over the sentiment series; higher is calmer,
    /// bounded in (0, 1]
    pub stability: f64,
    pub mood_progression: Vec<MoodPoint>,
}

/// A topic and how often it occurred
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicFrequency {
    pub topic: String,
    pub count: usize,
}

/// Topic frequency and trend classification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicTrends {
    /// All topics, most frequent first
    pub frequent: Vec<TopicFrequency>,
    pub emerging: Vec<String>,
    pub declining: Vec<String>,
}

/// Read-only pattern computation over the entry repository
pub struct PatternAnalyzer<R: RepositoryManager> {
    repos: Arc<R>,
    config: AnalyticsConfig,
}

impl<R: RepositoryManager> PatternAnalyzer<R> {
    pub fn new(repos: Arc<R>, config: AnalyticsConfig) -> Self {
        Self { repos, config }
    }

    /// Compute the full pattern analysis for a user
    pub async fn compute_patterns(&self, user_id: Uuid) -> Result<PatternAnalysis> {
        let mut entries = self
            .repos
            .entries()
            .find_all_by_user(&user_id)
            .await
            .context("failed to load entries")?;
        entries.sort_by_key(|e| e.created_at);
        Ok(analyze_entries(&entries, Utc::now(), &self.config))
    }
}

/// Analyze a chronologically sorted entry history as of `now`
pub fn analyze_entries(
    entries: &[Entry],
    now: DateTime<Utc>,
    config: &AnalyticsConfig,
) -> PatternAnalysis {
    let consistency = consistency_metrics(entries, now.date_naive());
    let emotional_trends = trends::emotional_trends(entries);
    let topics = trends::topic_trends(entries, config);
    let recommendations = recommendations(&consistency, &emotional_trends, now.date_naive(), config);

    PatternAnalysis {
        consistency,
        emotional_trends,
        topics,
        recommendations,
    }
}

fn consistency_metrics(entries: &[Entry], today: NaiveDate) -> ConsistencyMetrics {
    if entries.is_empty() {
        return ConsistencyMetrics {
            streak_days: 0,
            total_entries: 0,
            avg_entries_per_week: 0.0,
            most_active_day: None,
            completion_rate: 0.0,
        };
    }

    let days = streak::entry_day_set(entries);
    let streak_days = streak::streak_ending_on(&days, today, None);

    let first = entries[0].created_at;
    let last = entries[entries.len() - 1].created_at;
    let span_days = (last - first).num_days().max(0) as f64;
    let weeks = (span_days / 7.0).max(1.0);
    let avg_entries_per_week = entries.len() as f64 / weeks;

    let mut weekday_counts = [0usize; 7];
    for entry in entries {
        weekday_counts[entry.created_at.weekday().num_days_from_monday() as usize] += 1;
    }
    let mut best = 0;
    for (weekday, count) in weekday_counts.iter().enumerate() {
        if *count > weekday_counts[best] {
            best = weekday;
        }
    }
    let most_active_day = Some(weekday_name(best).to_string());

    let active_this_month = days
        .iter()
        .filter(|d| d.year() == today.year() && d.month() == today.month())
        .count();
    let completion_rate = active_this_month as f64 / f64::from(days_in_month(today));

    ConsistencyMetrics {
        streak_days,
        total_entries: entries.len(),
        avg_entries_per_week,
        most_active_day,
        completion_rate,
    }
}

/// Threshold-driven suggestions derived from the computed metrics only
fn recommendations(
    consistency: &ConsistencyMetrics,
    emotional: &EmotionalTrends,
    today: NaiveDate,
    config: &AnalyticsConfig,
) -> Vec<String> {
    if consistency.total_entries == 0 {
        return vec!["Record your first entry to start building your journal.".to_string()];
    }

    let mut recommendations = Vec::new();

    if consistency.streak_days == 0 {
        recommendations
            .push("Your streak is broken. Record a short entry today to start a new one.".to_string());
    } else if consistency.streak_days >= 7 {
        recommendations.push(format!(
            "You're on a {}-day streak. Keep it going.",
            consistency.streak_days
        ));
    }

    if let Some(delta) = mood_delta(
        &emotional.mood_progression,
        today,
        config.recent_window_days,
    ) {
        if delta <= -0.5 {
            recommendations.push(
                "Your mood has been trending down this week. Consider a calming routine before journaling."
                    .to_string(),
            );
        }
    }

    if consistency.avg_entries_per_week < 3.0 {
        recommendations
            .push("Try journaling a few more times a week to sharpen your trends.".to_string());
    }

    if consistency.completion_rate >= 0.8 {
        recommendations
            .push("You've journaled almost every day this month. Impressive consistency.".to_string());
    }

    recommendations
}

/// Mean mood of the recent window minus the window before it, `None` when
/// either window has no data
fn mood_delta(progression: &[MoodPoint], today: NaiveDate, window_days: i64) -> Option<f64> {
    let recent_start = today - Duration::days(window_days - 1);
    let prior_start = recent_start - Duration::days(window_days);

    let recent: Vec<f64> = progression
        .iter()
        .filter(|p| p.date >= recent_start)
        .map(|p| p.sentiment)
        .collect();
    let prior: Vec<f64> = progression
        .iter()
        .filter(|p| p.date >= prior_start && p.date < recent_start)
        .map(|p| p.sentiment)
        .collect();

    if recent.is_empty() || prior.is_empty() {
        return None;
    }
    Some(mean(&recent) - mean(&prior))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn weekday_name(num_days_from_monday: usize) -> &'static str {
    match num_days_from_monday {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1);
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1);
    match (first, first_of_next) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 30,
    }
}
