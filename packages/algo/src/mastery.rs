//! Mastery Tracking and Review Scheduling
//!
//! A fixed-ladder spaced-repetition scheduler:
//!
//! - correct answers move mastery asymptotically toward 1.0 and push the next
//!   review out along [`SRS_INTERVALS_DAYS`], scaled by item difficulty
//! - incorrect answers apply a fixed mastery penalty and bring the item back
//!   after [`RELAPSE_INTERVAL_MINUTES`]
//!
//! All functions are pure; callers supply `now`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    MASTERY_GAIN_RATE, MASTERY_PENALTY, MASTERY_THRESHOLD, MAX_DIFFICULTY,
    RELAPSE_INTERVAL_MINUTES, SRS_INTERVALS_DAYS,
};

const MS_PER_DAY: f64 = 86_400_000.0;

// ==================== Score Update ====================

/// New mastery score after one attempt, always within [0, 1]
pub fn update_mastery(current: f64, is_correct: bool) -> f64 {
    let current = if current.is_finite() { current.clamp(0.0, 1.0) } else { 0.0 };
    if is_correct {
        (current + MASTERY_GAIN_RATE * (1.0 - current)).min(1.0)
    } else {
        (current - MASTERY_PENALTY).max(0.0)
    }
}

pub fn is_mastered(mastery: f64) -> bool {
    mastery >= MASTERY_THRESHOLD
}

// ==================== Interval Computation ====================

/// Interval multiplier: difficulty 0 → 1.5×, 500 → 1.0×, 1000 → 0.5×
pub fn difficulty_factor(difficulty: u32) -> f64 {
    1.5 - f64::from(difficulty.min(MAX_DIFFICULTY)) / 1000.0
}

/// Ladder rung for a streak; streaks past the end reuse the last rung
pub fn ladder_days(correct_streak: u32) -> u32 {
    let idx = (correct_streak as usize).min(SRS_INTERVALS_DAYS.len() - 1);
    SRS_INTERVALS_DAYS[idx]
}

/// Time until the next review
pub fn review_interval(correct_streak: u32, is_correct: bool, difficulty: u32) -> Duration {
    if !is_correct {
        return Duration::minutes(RELAPSE_INTERVAL_MINUTES);
    }
    let days = f64::from(ladder_days(correct_streak)) * difficulty_factor(difficulty);
    Duration::milliseconds((days * MS_PER_DAY).round() as i64)
}

pub fn compute_next_due(
    now: DateTime<Utc>,
    correct_streak: u32,
    is_correct: bool,
    difficulty: u32,
) -> DateTime<Utc> {
    now + review_interval(correct_streak, is_correct, difficulty)
}

// ==================== State Transition ====================

/// Scheduler-relevant part of a learner's state for one item
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    pub mastery: f64,
    pub correct_streak: u32,
    pub lapse_count: u32,
}

/// State after an attempt has been applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedState {
    pub mastery: f64,
    pub correct_streak: u32,
    pub lapse_count: u32,
    pub last_seen_at: DateTime<Utc>,
    pub next_due_at: DateTime<Utc>,
}

impl MemoryState {
    /// State of an item the learner has never attempted
    pub fn unseen() -> Self {
        Self::default()
    }

    /// Applies one attempt. The interval is chosen from the streak *after*
    /// this attempt, so a first correct answer lands on the second rung.
    pub fn review(&self, is_correct: bool, difficulty: u32, now: DateTime<Utc>) -> ReviewedState {
        let correct_streak = if is_correct {
            self.correct_streak.saturating_add(1)
        } else {
            0
        };
        let lapse_count = if is_correct {
            self.lapse_count
        } else {
            self.lapse_count.saturating_add(1)
        };

        ReviewedState {
            mastery: update_mastery(self.mastery, is_correct),
            correct_streak,
            lapse_count,
            last_seen_at: now,
            next_due_at: compute_next_due(now, correct_streak, is_correct, difficulty),
        }
    }
}

impl From<ReviewedState> for MemoryState {
    fn from(value: ReviewedState) -> Self {
        Self {
            mastery: value.mastery,
            correct_streak: value.correct_streak,
            lapse_count: value.lapse_count,
        }
    }
}
