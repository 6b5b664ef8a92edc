//! Common Types and Constants
//!
//! Shared data structures used across all algorithm modules.

use serde::{Deserialize, Serialize};

// ==================== Scheduling Constants ====================

/// Review ladder in days, indexed by correct streak (capped at the last rung)
pub const SRS_INTERVALS_DAYS: [u32; 5] = [1, 3, 7, 14, 30];

/// Relapse interval after an incorrect answer
pub const RELAPSE_INTERVAL_MINUTES: i64 = 10;

/// Difficulty assumed when a question carries none
pub const DEFAULT_DIFFICULTY: u32 = 500;

/// Upper bound of the difficulty scale
pub const MAX_DIFFICULTY: u32 = 1000;

/// Mastery gain factor applied to the remaining distance to 1.0
pub const MASTERY_GAIN_RATE: f64 = 0.1;

/// Fixed mastery penalty on an incorrect answer
pub const MASTERY_PENALTY: f64 = 0.2;

/// Mastery score at which an item counts as mastered
pub const MASTERY_THRESHOLD: f64 = 0.7;

// ==================== Unlock Constants ====================

/// Items unlocked before anything is mastered
pub const BASE_POOL_SIZE: u32 = 10;

// ==================== Session Constants ====================

/// Share of a session reserved for due reviews, in tenths
pub const DUE_SHARE_TENTHS: usize = 6;

/// Share of a session reserved for near-due reviews, in tenths
pub const NEAR_DUE_SHARE_TENTHS: usize = 3;

/// Look-ahead window for near-due reviews
pub const NEAR_DUE_WINDOW_HOURS: i64 = 24;

// ==================== XP Constants ====================

/// XP per correctly filled blank
pub const XP_CORRECT: u32 = 10;

/// XP per incorrectly filled blank
pub const XP_INCORRECT: u32 = 2;

/// Bonus when every blank of a round is correct
pub const XP_ALL_CORRECT_BONUS: u32 = 5;

/// Bonus for identifying the reference in medium/hard rounds
pub const XP_REFERENCE_CORRECT: u32 = 15;

/// XP multiplier per level step (threshold = factor × level²)
pub const LEVEL_XP_FACTOR: u64 = 50;

/// Rounds answered faster than this are treated as suspicious
pub const SUSPICIOUS_RESPONSE_MS: u64 = 1500;

// ==================== Game Mode ====================

/// Difficulty mode chosen by the learner for a round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl GameMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(GameMode::Easy),
            "medium" => Some(GameMode::Medium),
            "hard" => Some(GameMode::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Easy => "easy",
            GameMode::Medium => "medium",
            GameMode::Hard => "hard",
        }
    }

    /// XP multiplier applied to the raw round total
    pub fn multiplier(&self) -> f64 {
        match self {
            GameMode::Easy => 0.5,
            GameMode::Medium => 1.0,
            GameMode::Hard => 1.5,
        }
    }

    /// Medium and hard rounds add a reference-identification phase
    pub fn has_reference_phase(&self) -> bool {
        !matches!(self, GameMode::Easy)
    }
}

// ==================== Streak Milestones ====================

/// Celebration tier reached at specific streak counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakMilestone {
    Cute,
    Cool,
    Crazy,
}
