//! Catalog seeding from a JSON document
//!
//! ```json
//! {
//!   "learners": [{ "id": "alice", "username": "Alice", "sessionToken": "dev-alice" }],
//!   "items": [{ "id": "jhn-3-16", "bookId": 43, "bookName": "John", "testament": "NT",
//!               "chapter": 3, "verse": 16, "globalRank": 1, "globalDifficulty": 200,
//!               "released": true, "texts": { "NIV": "For God so loved the world..." } }],
//!   "questions": [{ "id": "q1", "itemId": "jhn-3-16", "kind": "BLANKS", "translationId": "NIV",
//!                   "answer": { "word_indices": [1], "answers": ["God"] }, "difficulty": 400 }]
//! }
//! ```
//!
//! Ranks must be unique across the catalog; a seed with a repeated rank is
//! rejected before anything is written. Every record is upserted by id.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

use learnbible_algo::{duplicate_ranks, DEFAULT_DIFFICULTY};

use crate::auth::hash_token;
use crate::store::{Item, Learner, Question, QuestionKind, RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("global rank {rank} is used by both {first} and {second}")]
    DuplicateRank {
        rank: u32,
        first: String,
        second: String,
    },
    #[error("question {question_id} references unknown item {item_id}")]
    UnknownItem {
        question_id: String,
        item_id: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerSeed {
    pub id: String,
    pub username: String,
    /// Raw token; only its digest is stored
    pub session_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSeed {
    #[serde(flatten)]
    pub item: Item,
    /// Verse text keyed by translation id
    #[serde(default)]
    pub texts: BTreeMap<String, String>,
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSeed {
    pub id: String,
    pub item_id: String,
    pub kind: QuestionKind,
    pub translation_id: String,
    #[serde(alias = "answerJson")]
    pub answer: serde_json::Value,
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSeed {
    #[serde(default)]
    pub learners: Vec<LearnerSeed>,
    #[serde(default)]
    pub items: Vec<ItemSeed>,
    #[serde(default)]
    pub questions: Vec<QuestionSeed>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub learners: usize,
    pub items: usize,
    pub texts: usize,
    pub questions: usize,
}

impl CatalogSeed {
    pub fn parse(json: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<(), SeedError> {
        let items: Vec<Item> = self.items.iter().map(|s| s.item.clone()).collect();
        if let Some(&rank) = duplicate_ranks(&items).first() {
            let mut holders = items.iter().filter(|i| i.global_rank == rank).map(|i| &i.id);
            let first = holders.next().cloned().unwrap_or_default();
            let second = holders.next().cloned().unwrap_or_default();
            return Err(SeedError::DuplicateRank {
                rank,
                first,
                second,
            });
        }

        let known: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        if let Some(orphan) = self
            .questions
            .iter()
            .find(|q| !known.contains(q.item_id.as_str()))
        {
            return Err(SeedError::UnknownItem {
                question_id: orphan.id.clone(),
                item_id: orphan.item_id.clone(),
            });
        }

        Ok(())
    }
}

/// Validates then writes the whole catalog. Questions without a creation
/// time keep their document order.
pub async fn apply_seed(
    store: &dyn RecordStore,
    seed: &CatalogSeed,
    now: DateTime<Utc>,
) -> Result<SeedSummary, SeedError> {
    seed.validate()?;
    let mut summary = SeedSummary::default();

    for learner in &seed.learners {
        store
            .insert_learner(&Learner {
                id: learner.id.clone(),
                username: learner.username.clone(),
            })
            .await?;
        if let Some(token) = &learner.session_token {
            store.insert_session(&hash_token(token), &learner.id).await?;
        }
        summary.learners += 1;
    }

    for entry in &seed.items {
        store.insert_item(&entry.item).await?;
        for (translation_id, text) in &entry.texts {
            store
                .insert_verse_text(&entry.item.id, translation_id, text)
                .await?;
            summary.texts += 1;
        }
        summary.items += 1;
    }

    for (offset, q) in seed.questions.iter().enumerate() {
        let created_at = q
            .created_at
            .unwrap_or_else(|| now + Duration::milliseconds(offset as i64));
        store
            .insert_question(&Question {
                id: q.id.clone(),
                item_id: q.item_id.clone(),
                kind: q.kind,
                translation_id: q.translation_id.clone(),
                answer_json: q.answer.clone(),
                difficulty: q.difficulty,
                active: q.active,
                created_at,
            })
            .await?;
        summary.questions += 1;
    }

    tracing::info!(
        learners = summary.learners,
        items = summary.items,
        texts = summary.texts,
        questions = summary.questions,
        "catalog seeded"
    );

    Ok(summary)
}

pub async fn seed_from_path(
    store: &dyn RecordStore,
    path: &Path,
) -> Result<SeedSummary, SeedError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let seed = CatalogSeed::parse(&raw)?;
    apply_seed(store, &seed, Utc::now()).await
}
