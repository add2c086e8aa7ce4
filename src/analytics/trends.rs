// src/analytics/trends.rs
//! Emotional and topic trend computation
//!
//! Pure functions over a user's chronologically sorted entries. Entries
//! without an analysis block simply drop out of the series.

use std::collections::{BTreeMap, HashMap};

use chrono::Duration;

use crate::config::AnalyticsConfig;
use crate::repository::Entry;

use super::{EmotionalTrends, MoodPoint, TopicFrequency, TopicTrends};

pub(crate) fn emotion_label(bucket: i32) -> &'static str {
    match bucket {
        1 => "very negative",
        2 => "negative",
        4 => "positive",
        5 => "very positive",
        _ => "neutral",
    }
}

/// Mood progression (daily mean), dominant sentiment bucket and a bounded
/// inverse-variance stability score in (0, 1].
pub fn emotional_trends(entries: &[Entry]) -> EmotionalTrends {
    let mut by_day: BTreeMap<chrono::NaiveDate, Vec<i32>> = BTreeMap::new();
    let mut sentiments: Vec<i32> = Vec::new();
    for entry in entries {
        if let Some(analysis) = &entry.ai_analysis {
            by_day
                .entry(entry.created_at.date_naive())
                .or_default()
                .push(analysis.sentiment);
            sentiments.push(analysis.sentiment);
        }
    }

    if sentiments.is_empty() {
        return EmotionalTrends {
            dominant_emotion: None,
            stability: 1.0,
            mood_progression: Vec::new(),
        };
    }

    let mood_progression = by_day
        .into_iter()
        .map(|(date, day)| MoodPoint {
            date,
            sentiment: day.iter().sum::<i32>() as f64 / day.len() as f64,
        })
        .collect();

    // Most frequent bucket; ties resolve to the more negative bucket so the
    // result is stable across runs.
    let mut counts = [0usize; 5];
    for sentiment in &sentiments {
        counts[(sentiment - 1).clamp(0, 4) as usize] += 1;
    }
    let mut best = 0;
    for (bucket, count) in counts.iter().enumerate() {
        if *count > counts[best] {
            best = bucket;
        }
    }
    let dominant_emotion = Some(emotion_label(best as i32 + 1).to_string());

    let mean = sentiments.iter().sum::<i32>() as f64 / sentiments.len() as f64;
    let variance = sentiments
        .iter()
        .map(|s| {
            let delta = f64::from(*s) - mean;
            delta * delta
        })
        .sum::<f64>()
        / sentiments.len() as f64;
    let stability = 1.0 / (1.0 + variance);

    EmotionalTrends {
        dominant_emotion,
        stability,
        mood_progression,
    }
}

/// Frequent, emerging and declining topics. The timeline splits at two
/// thirds of the span between first and last entry; a topic's per-entry rate
/// in the recent third is compared against its earlier rate under the
/// configured ratio. Histories below the minimum entry count return empty
/// lists.
pub fn topic_trends(entries: &[Entry], config: &AnalyticsConfig) -> TopicTrends {
    if entries.is_empty() || entries.len() < config.min_entries_for_topics {
        return TopicTrends::default();
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        if let Some(analysis) = &entry.ai_analysis {
            for topic in &analysis.topics {
                let topic = topic.trim().to_lowercase();
                if !topic.is_empty() {
                    *counts.entry(topic).or_default() += 1;
                }
            }
        }
    }
    if counts.is_empty() {
        return TopicTrends::default();
    }

    let mut frequent: Vec<TopicFrequency> = counts
        .iter()
        .map(|(topic, count)| TopicFrequency {
            topic: topic.clone(),
            count: *count,
        })
        .collect();
    frequent.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));

    // Entries are sorted; a zero span cannot be split into windows.
    let first = entries[0].created_at;
    let last = entries[entries.len() - 1].created_at;
    let span = last - first;
    if span.num_seconds() <= 0 {
        return TopicTrends {
            frequent,
            emerging: Vec::new(),
            declining: Vec::new(),
        };
    }
    let boundary = first + Duration::seconds(span.num_seconds() * 2 / 3);

    let mut early_counts: HashMap<String, usize> = HashMap::new();
    let mut recent_counts: HashMap<String, usize> = HashMap::new();
    let mut early_entries = 0usize;
    let mut recent_entries = 0usize;
    for entry in entries {
        let recent = entry.created_at > boundary;
        if recent {
            recent_entries += 1;
        } else {
            early_entries += 1;
        }
        if let Some(analysis) = &entry.ai_analysis {
            for topic in &analysis.topics {
                let topic = topic.trim().to_lowercase();
                if topic.is_empty() {
                    continue;
                }
                let window = if recent {
                    &mut recent_counts
                } else {
                    &mut early_counts
                };
                *window.entry(topic).or_default() += 1;
            }
        }
    }

    // The first entry always lands in the early window and the last in the
    // recent one, so both rates are well-defined.
    let mut emerging = Vec::new();
    let mut declining = Vec::new();
    for topic in counts.keys() {
        let early_rate =
            early_counts.get(topic).copied().unwrap_or(0) as f64 / early_entries as f64;
        let recent_rate =
            recent_counts.get(topic).copied().unwrap_or(0) as f64 / recent_entries as f64;
        if recent_rate > config.emerging_ratio * early_rate && recent_rate > 0.0 {
            emerging.push(topic.clone());
        } else if early_rate > config.emerging_ratio * recent_rate && early_rate > 0.0 {
            declining.push(topic.clone());
        }
    }
    emerging.sort();
    declining.sort();

    TopicTrends {
        frequent,
        emerging,
        declining,
    }
}
