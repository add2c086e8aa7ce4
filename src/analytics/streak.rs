// src/analytics/streak.rs
//! Calendar-day bucketing and streak computation
//!
//! Shared by the achievement engine (capped walk against a criteria target)
//! and the pattern analyzer (uncapped walk).

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::repository::Entry;

/// Calendar days (UTC) on which at least one entry exists
pub fn entry_day_set(entries: &[Entry]) -> HashSet<NaiveDate> {
    entries.iter().map(|e| e.created_at.date_naive()).collect()
}

/// Consecutive days with at least one entry, walking backward from `today`.
/// Stops at the first missing day, or at `cap` when one is given.
pub fn streak_ending_on(days: &HashSet<NaiveDate>, today: NaiveDate, cap: Option<u32>) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        if let Some(cap) = cap {
            if streak >= cap {
                break;
            }
        }
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}
