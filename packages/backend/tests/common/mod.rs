#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use learnbible_backend::config::Config;
use learnbible_backend::seed::{apply_seed, CatalogSeed};
use learnbible_backend::state::AppState;
use learnbible_backend::store::{LearnerItemState, MemoryStore, RecordStore};

pub const ALICE: &str = "alice";
pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB: &str = "bob";
pub const BOB_TOKEN: &str = "bob-token";

/// Twelve released verses: ranks 1-6 in Genesis (OT), 7-12 in John (NT).
/// Difficulty falls as rank rises, so v12 is the easiest and v01 the hardest.
pub fn catalog_json() -> Value {
    let items: Vec<Value> = (1..=12u32)
        .map(|rank| {
            let (book_id, book_name, testament, chapter) = if rank <= 6 {
                (1, "Genesis", "OT", 1)
            } else {
                (43, "John", "NT", 3)
            };
            json!({
                "id": item_id(rank),
                "bookId": book_id,
                "bookName": book_name,
                "testament": testament,
                "chapter": chapter,
                "verse": rank,
                "globalRank": rank,
                "globalDifficulty": (13 - rank) * 50,
                "released": true,
                "texts": { "NIV": format!("In the beginning God created verse {rank}") }
            })
        })
        .collect();

    let questions: Vec<Value> = (1..=12u32)
        .map(|rank| {
            json!({
                "id": question_id(rank),
                "itemId": item_id(rank),
                "kind": "BLANKS",
                "translationId": "NIV",
                "answer": { "word_indices": [2, 3], "answers": ["beginning", "God"] }
            })
        })
        .collect();

    json!({
        "learners": [
            { "id": ALICE, "username": "Alice", "sessionToken": ALICE_TOKEN },
            { "id": BOB, "username": "Bob", "sessionToken": BOB_TOKEN }
        ],
        "items": items,
        "questions": questions
    })
}

pub fn item_id(rank: u32) -> String {
    format!("v{rank:02}")
}

pub fn question_id(rank: u32) -> String {
    format!("q-v{rank:02}")
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
}

pub async fn seed_into(store: &dyn RecordStore) {
    let seed = CatalogSeed::parse(&catalog_json().to_string()).expect("catalog parses");
    apply_seed(store, &seed, now()).await.expect("catalog seeds");
}

pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    seed_into(store.as_ref()).await;
    store
}

pub fn state_row(
    learner_id: &str,
    rank: u32,
    mastery: f64,
    next_due_at: DateTime<Utc>,
) -> LearnerItemState {
    LearnerItemState {
        learner_id: learner_id.to_string(),
        item_id: item_id(rank),
        mastery,
        correct_streak: 1,
        lapse_count: 0,
        introduced_at: now() - chrono::Duration::days(30),
        last_seen_at: Some(now() - chrono::Duration::days(1)),
        next_due_at,
    }
}

pub fn create_test_app_with(store: Arc<MemoryStore>) -> Router {
    learnbible_backend::create_app(AppState::with_store(store, Config::default()))
}

pub async fn create_test_app() -> (Router, Arc<MemoryStore>) {
    let store = seeded_store().await;
    (create_test_app_with(store.clone()), store)
}
