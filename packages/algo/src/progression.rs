//! XP Progression
//!
//! Converts raw experience deltas into levels. Level `n` requires a cumulative
//! total of `50 × n²` XP; level 0 is the zero baseline.

use serde::{Deserialize, Serialize};

use crate::types::{StreakMilestone, LEVEL_XP_FACTOR};

/// Result of applying gained XP to a learner's totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpApplied {
    pub new_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
}

/// Progress-bar view of a learner's position inside the current level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub xp: u64,
    pub level: u32,
    pub xp_within_level: u64,
    pub xp_to_next_level: u64,
    pub progress: f64,
}

impl LevelProgress {
    pub fn of(xp: u64, level: u32) -> Self {
        Self {
            xp,
            level,
            xp_within_level: xp_within_level(xp, level),
            xp_to_next_level: xp_to_next_level(level),
            progress: level_progress(xp, level),
        }
    }
}

/// Total XP required to reach `level`
pub fn level_threshold(level: u32) -> u64 {
    let level = u64::from(level);
    LEVEL_XP_FACTOR * level * level
}

/// Adds `gained` to the running total and climbs as many levels as the new
/// total allows. Levels never go down.
pub fn apply_xp(current_xp: u64, current_level: u32, gained: u64) -> XpApplied {
    let new_xp = current_xp.saturating_add(gained);
    let mut level = current_level;

    while new_xp >= level_threshold(level + 1) {
        level += 1;
    }

    XpApplied {
        new_xp,
        new_level: level,
        leveled_up: level > current_level,
    }
}

/// XP earned since the current level's threshold (0 when below it)
pub fn xp_within_level(xp: u64, level: u32) -> u64 {
    xp.saturating_sub(level_threshold(level))
}

/// XP span between the current level and the next one
pub fn xp_to_next_level(level: u32) -> u64 {
    level_threshold(level + 1) - level_threshold(level)
}

/// Fraction of the current level completed, in [0, 1]
pub fn level_progress(xp: u64, level: u32) -> f64 {
    let needed = xp_to_next_level(level);
    if needed == 0 {
        return 1.0;
    }
    (xp_within_level(xp, level) as f64 / needed as f64).min(1.0)
}

/// Milestone hit when a streak reaches exactly 3, 5, 10, 15, 20, ...
pub fn streak_milestone(streak: u32) -> Option<StreakMilestone> {
    match streak {
        3 => Some(StreakMilestone::Cute),
        5 => Some(StreakMilestone::Cool),
        s if s >= 10 && (s - 10) % 5 == 0 => Some(StreakMilestone::Crazy),
        _ => None,
    }
}
