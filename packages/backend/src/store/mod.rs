//! Record store abstraction
//!
//! Services only reach persistence through [`RecordStore`] and
//! [`ContentProvider`]. Every fallible call returns [`StoreError`]; callers
//! propagate it unchanged (no retry).

pub mod memory;
pub mod models;
pub mod payload;
pub mod sqlite;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use models::*;
pub use payload::{
    AnswerPayload, BlankGrade, BlanksPayload, ChoicePayload, GameQuestion, QuestionError,
    ReferencePayload,
};
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    // ==================== Catalog ====================

    /// Items matching testament/book filters, ascending by global rank
    async fn find_items(&self, filters: &ItemFilters) -> Result<Vec<Item>, StoreError>;

    async fn find_item(&self, item_id: &str) -> Result<Option<Item>, StoreError>;

    async fn find_question(&self, question_id: &str) -> Result<Option<Question>, StoreError>;

    /// Active questions for the given items in one translation, oldest first
    /// (ties by id). `kind` narrows to one question type.
    async fn find_questions(
        &self,
        item_ids: &[String],
        translation_id: &str,
        kind: Option<QuestionKind>,
    ) -> Result<Vec<Question>, StoreError>;

    // ==================== Learner item state ====================

    async fn find_state(
        &self,
        learner_id: &str,
        item_id: &str,
    ) -> Result<Option<LearnerItemState>, StoreError>;

    /// States of `item_ids` whose `next_due_at` falls in `window`, most
    /// overdue first, at most `limit` rows
    async fn find_due_states(
        &self,
        learner_id: &str,
        item_ids: &[String],
        window: DueWindow,
        limit: usize,
    ) -> Result<Vec<LearnerItemState>, StoreError>;

    /// Subset of `item_ids` the learner already has a state row for
    async fn started_item_ids(
        &self,
        learner_id: &str,
        item_ids: &[String],
    ) -> Result<HashSet<String>, StoreError>;

    async fn count_mastered(&self, learner_id: &str, threshold: f64) -> Result<u32, StoreError>;

    async fn upsert_state(&self, state: &LearnerItemState) -> Result<(), StoreError>;

    // ==================== Attempts ====================

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StoreError>;

    async fn count_attempts(&self, learner_id: &str, item_id: &str) -> Result<u64, StoreError>;

    // ==================== Progression ====================

    async fn find_progression(
        &self,
        learner_id: &str,
    ) -> Result<Option<LearnerProgression>, StoreError>;

    async fn upsert_progression(&self, progression: &LearnerProgression)
        -> Result<(), StoreError>;

    /// Level desc, then xp desc, then learner id
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LearnerStanding>, StoreError>;

    /// Learners strictly ahead of (level, xp)
    async fn count_ranked_above(&self, level: u32, xp: u64) -> Result<u64, StoreError>;

    // ==================== Identity ====================

    async fn find_learner_by_session(&self, token_hash: &str)
        -> Result<Option<String>, StoreError>;

    // ==================== Seeding ====================

    async fn insert_learner(&self, learner: &Learner) -> Result<(), StoreError>;

    async fn insert_session(&self, token_hash: &str, learner_id: &str) -> Result<(), StoreError>;

    async fn insert_item(&self, item: &Item) -> Result<(), StoreError>;

    async fn insert_question(&self, question: &Question) -> Result<(), StoreError>;

    async fn insert_verse_text(
        &self,
        item_id: &str,
        translation_id: &str,
        text: &str,
    ) -> Result<(), StoreError>;
}

/// Opaque verse text lookup
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn verse_text(
        &self,
        item_id: &str,
        translation_id: &str,
    ) -> Result<Option<String>, StoreError>;
}
