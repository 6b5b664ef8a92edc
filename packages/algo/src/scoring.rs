//! Round Scoring
//!
//! XP for a completed round, anti-cheat timing gate, and the "full
//! correctness" signal that feeds the scheduler.

use serde::{Deserialize, Serialize};

use crate::types::{
    GameMode, SUSPICIOUS_RESPONSE_MS, XP_ALL_CORRECT_BONUS, XP_CORRECT, XP_INCORRECT,
    XP_REFERENCE_CORRECT,
};

/// Answer data of one round, as scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundAnswers {
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub all_blanks_correct: bool,
    /// `None` when no reference phase was played
    pub reference_correct: Option<bool>,
    /// `None` for clients without mode selection: scored as medium, but no
    /// reference phase is required for full correctness
    pub mode: Option<GameMode>,
    /// Learner's consecutive fully-correct rounds before this one
    pub streak_before: u32,
    pub response_time_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundScore {
    pub xp: u64,
    pub suspicious: bool,
    pub fully_correct: bool,
}

pub fn streak_bonus(streak: u32) -> u32 {
    if streak >= 10 {
        25
    } else if streak >= 5 {
        15
    } else if streak >= 3 {
        5
    } else {
        0
    }
}

/// Too fast to have read the verse and typed the blanks
pub fn is_suspicious(response_time_ms: Option<u64>) -> bool {
    matches!(response_time_ms, Some(ms) if ms < SUSPICIOUS_RESPONSE_MS)
}

impl RoundAnswers {
    /// Mode used for XP: medium when none was given
    pub fn scoring_mode(&self) -> GameMode {
        self.mode.unwrap_or_default()
    }
}

/// Counts come straight from the client, so every step saturates
pub fn blank_xp(answers: &RoundAnswers) -> u32 {
    let all_correct_bonus = if answers.all_blanks_correct {
        XP_ALL_CORRECT_BONUS
    } else {
        0
    };
    answers
        .correct_count
        .saturating_mul(XP_CORRECT)
        .saturating_add(answers.incorrect_count.saturating_mul(XP_INCORRECT))
        .saturating_add(all_correct_bonus)
        .saturating_add(streak_bonus(answers.streak_before))
}

pub fn reference_xp(answers: &RoundAnswers) -> u32 {
    if answers.scoring_mode().has_reference_phase() && answers.reference_correct == Some(true) {
        XP_REFERENCE_CORRECT
    } else {
        0
    }
}

/// XP before the anti-cheat gate
pub fn round_xp(answers: &RoundAnswers) -> u64 {
    let raw = f64::from(blank_xp(answers)) + f64::from(reference_xp(answers));
    (raw * answers.scoring_mode().multiplier()).round() as u64
}

/// Every required phase passed: all blanks, plus the reference in medium
/// and hard rounds
pub fn is_fully_correct(answers: &RoundAnswers) -> bool {
    let reference_required = answers.mode.is_some_and(|m| m.has_reference_phase());
    answers.all_blanks_correct && (!reference_required || answers.reference_correct == Some(true))
}

pub fn score_round(answers: &RoundAnswers) -> RoundScore {
    let suspicious = is_suspicious(answers.response_time_ms);
    RoundScore {
        xp: if suspicious { 0 } else { round_xp(answers) },
        suspicious,
        fully_correct: is_fully_correct(answers),
    }
}

// ==================== Answer Checking ====================

/// Case-insensitive, whitespace-trimmed, punctuation-stripped comparison
pub fn check_answer(input: &str, expected: &str) -> bool {
    normalize_answer(input) == normalize_answer(expected)
}

pub fn normalize_answer(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '\'')
        .collect()
}
