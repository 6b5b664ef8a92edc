//! # learnbible-algo - scripture memorization core algorithms
//!
//! Pure Rust implementations of the adaptive review scheduler:
//!
//! - **Progression** - cumulative XP thresholds and multi-level jumps
//! - **Mastery** - per-item mastery score and fixed-ladder review scheduling
//! - **Unlock** - mastery-paced gate on new item introduction
//! - **Session** - due / near-due / new blending with random fallback
//! - **Scoring** - round XP, anti-cheat timing gate, answer normalization
//!
//! ## Design
//!
//! Nothing here performs I/O or holds shared state. Every function is
//! deterministic given its inputs (including `now` and the RNG), so callers
//! can invoke them concurrently without synchronization.
//!
//! ## Module layout
//!
//! - [`progression`] - `level_threshold`, `apply_xp`, level progress, streak milestones
//! - [`mastery`] - `update_mastery`, `compute_next_due`, [`MemoryState`] transitions
//! - [`unlock`] - `pool_size`, `filter_unlocked_pool`, duplicate rank detection
//! - [`session`] - [`SessionAllocation`], bucket filling, fallback sampling
//! - [`scoring`] - [`RoundAnswers`] → [`RoundScore`], `check_answer`
//! - [`types`] - shared constants and enums
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use learnbible_algo::{apply_xp, MemoryState, SessionAllocation};
//!
//! let applied = apply_xp(190, 1, 10);
//! assert!(applied.leveled_up);
//!
//! let reviewed = MemoryState::unseen().review(true, 500, Utc::now());
//! assert_eq!(reviewed.correct_streak, 1);
//!
//! let alloc = SessionAllocation::for_target(10);
//! assert_eq!((alloc.due, alloc.near_due, alloc.new), (6, 3, 1));
//! ```

pub mod mastery;
pub mod progression;
pub mod scoring;
pub mod session;
pub mod types;
pub mod unlock;

pub use types::*;

pub use mastery::{
    compute_next_due, difficulty_factor, is_mastered, review_interval, update_mastery,
    MemoryState, ReviewedState,
};
pub use progression::{
    apply_xp, level_progress, level_threshold, streak_milestone, xp_to_next_level,
    xp_within_level, LevelProgress, XpApplied,
};
pub use scoring::{check_answer, is_suspicious, score_round, RoundAnswers, RoundScore};
pub use session::{sample_fallback, BucketPicker, SessionAllocation};
pub use unlock::{duplicate_ranks, filter_unlocked_pool, pool_size, Ranked};
