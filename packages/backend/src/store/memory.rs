use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{
    Attempt, ContentProvider, DueWindow, Item, ItemFilters, Learner, LearnerItemState,
    LearnerProgression, LearnerStanding, Question, QuestionKind, RecordStore, StoreError,
};

#[derive(Debug, Default)]
struct Tables {
    learners: HashMap<String, Learner>,
    sessions: HashMap<String, String>,
    items: HashMap<String, Item>,
    verse_texts: HashMap<(String, String), String>,
    questions: HashMap<String, Question>,
    states: HashMap<(String, String), LearnerItemState>,
    attempts: Vec<Attempt>,
    progressions: HashMap<String, LearnerProgression>,
}

/// In-process store for tests and local runs. `set_available(false)` makes
/// every call fail with [`StoreError::Unavailable`].
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Attempt log of one learner, in insertion order
    pub fn attempts_of(&self, learner_id: &str) -> Vec<Attempt> {
        self.tables
            .read()
            .attempts
            .iter()
            .filter(|a| a.learner_id == learner_id)
            .cloned()
            .collect()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn state_key(learner_id: &str, item_id: &str) -> (String, String) {
    (learner_id.to_string(), item_id.to_string())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_items(&self, filters: &ItemFilters) -> Result<Vec<Item>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read();
        let mut items: Vec<Item> = tables
            .items
            .values()
            .filter(|item| filters.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.global_rank.cmp(&b.global_rank).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn find_item(&self, item_id: &str) -> Result<Option<Item>, StoreError> {
        self.ensure_available()?;
        Ok(self.tables.read().items.get(item_id).cloned())
    }

    async fn find_question(&self, question_id: &str) -> Result<Option<Question>, StoreError> {
        self.ensure_available()?;
        Ok(self.tables.read().questions.get(question_id).cloned())
    }

    async fn find_questions(
        &self,
        item_ids: &[String],
        translation_id: &str,
        kind: Option<QuestionKind>,
    ) -> Result<Vec<Question>, StoreError> {
        self.ensure_available()?;
        let wanted: HashSet<&str> = item_ids.iter().map(String::as_str).collect();
        let tables = self.tables.read();
        let mut questions: Vec<Question> = tables
            .questions
            .values()
            .filter(|q| {
                q.active
                    && q.translation_id == translation_id
                    && wanted.contains(q.item_id.as_str())
                    && kind.map_or(true, |k| q.kind == k)
            })
            .cloned()
            .collect();
        questions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(questions)
    }

    async fn find_state(
        &self,
        learner_id: &str,
        item_id: &str,
    ) -> Result<Option<LearnerItemState>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .tables
            .read()
            .states
            .get(&state_key(learner_id, item_id))
            .cloned())
    }

    async fn find_due_states(
        &self,
        learner_id: &str,
        item_ids: &[String],
        window: DueWindow,
        limit: usize,
    ) -> Result<Vec<LearnerItemState>, StoreError> {
        self.ensure_available()?;
        let wanted: HashSet<&str> = item_ids.iter().map(String::as_str).collect();
        let tables = self.tables.read();
        let mut states: Vec<LearnerItemState> = tables
            .states
            .values()
            .filter(|s| {
                s.learner_id == learner_id
                    && wanted.contains(s.item_id.as_str())
                    && window.contains(s.next_due_at)
            })
            .cloned()
            .collect();
        states.sort_by(|a, b| {
            a.next_due_at
                .cmp(&b.next_due_at)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        states.truncate(limit);
        Ok(states)
    }

    async fn started_item_ids(
        &self,
        learner_id: &str,
        item_ids: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read();
        Ok(item_ids
            .iter()
            .filter(|id| tables.states.contains_key(&state_key(learner_id, id)))
            .cloned()
            .collect())
    }

    async fn count_mastered(&self, learner_id: &str, threshold: f64) -> Result<u32, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read();
        let count = tables
            .states
            .values()
            .filter(|s| {
                s.learner_id == learner_id
                    && s.mastery >= threshold
                    && tables.items.contains_key(&s.item_id)
            })
            .count();
        Ok(count as u32)
    }

    async fn upsert_state(&self, state: &LearnerItemState) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.tables.write().states.insert(
            state_key(&state.learner_id, &state.item_id),
            state.clone(),
        );
        Ok(())
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.tables.write().attempts.push(attempt.clone());
        Ok(())
    }

    async fn count_attempts(&self, learner_id: &str, item_id: &str) -> Result<u64, StoreError> {
        self.ensure_available()?;
        let count = self
            .tables
            .read()
            .attempts
            .iter()
            .filter(|a| a.learner_id == learner_id && a.item_id == item_id)
            .count();
        Ok(count as u64)
    }

    async fn find_progression(
        &self,
        learner_id: &str,
    ) -> Result<Option<LearnerProgression>, StoreError> {
        self.ensure_available()?;
        Ok(self.tables.read().progressions.get(learner_id).cloned())
    }

    async fn upsert_progression(
        &self,
        progression: &LearnerProgression,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.tables
            .write()
            .progressions
            .insert(progression.learner_id.clone(), progression.clone());
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LearnerStanding>, StoreError> {
        self.ensure_available()?;
        let tables = self.tables.read();
        let mut standings: Vec<LearnerStanding> = tables
            .progressions
            .values()
            .map(|p| LearnerStanding {
                learner_id: p.learner_id.clone(),
                username: tables
                    .learners
                    .get(&p.learner_id)
                    .map(|l| l.username.clone())
                    .unwrap_or_else(|| p.learner_id.clone()),
                xp: p.xp,
                level: p.level,
            })
            .collect();
        standings.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then_with(|| b.xp.cmp(&a.xp))
                .then_with(|| a.learner_id.cmp(&b.learner_id))
        });
        standings.truncate(limit);
        Ok(standings)
    }

    async fn count_ranked_above(&self, level: u32, xp: u64) -> Result<u64, StoreError> {
        self.ensure_available()?;
        let count = self
            .tables
            .read()
            .progressions
            .values()
            .filter(|p| p.level > level || (p.level == level && p.xp > xp))
            .count();
        Ok(count as u64)
    }

    async fn find_learner_by_session(
        &self,
        token_hash: &str,
    ) -> Result<Option<String>, StoreError> {
        self.ensure_available()?;
        Ok(self.tables.read().sessions.get(token_hash).cloned())
    }

    async fn insert_learner(&self, learner: &Learner) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.tables
            .write()
            .learners
            .insert(learner.id.clone(), learner.clone());
        Ok(())
    }

    async fn insert_session(&self, token_hash: &str, learner_id: &str) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.tables
            .write()
            .sessions
            .insert(token_hash.to_string(), learner_id.to_string());
        Ok(())
    }

    async fn insert_item(&self, item: &Item) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.tables.write().items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn insert_question(&self, question: &Question) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.tables
            .write()
            .questions
            .insert(question.id.clone(), question.clone());
        Ok(())
    }

    async fn insert_verse_text(
        &self,
        item_id: &str,
        translation_id: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.tables
            .write()
            .verse_texts
            .insert(state_key(item_id, translation_id), text.to_string());
        Ok(())
    }
}

#[async_trait]
impl ContentProvider for MemoryStore {
    async fn verse_text(
        &self,
        item_id: &str,
        translation_id: &str,
    ) -> Result<Option<String>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .tables
            .read()
            .verse_texts
            .get(&state_key(item_id, translation_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn state(item_id: &str, mastery: f64, due_in_hours: i64) -> LearnerItemState {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        LearnerItemState {
            learner_id: "alice".to_string(),
            item_id: item_id.to_string(),
            mastery,
            correct_streak: 0,
            lapse_count: 0,
            introduced_at: now,
            last_seen_at: Some(now),
            next_due_at: now + Duration::hours(due_in_hours),
        }
    }

    #[tokio::test]
    async fn test_due_states_ordered_and_limited() {
        let store = MemoryStore::new();
        for (id, hours) in [("a", -1), ("b", -48), ("c", -5), ("d", 3)] {
            store.upsert_state(&state(id, 0.2, hours)).await.unwrap();
        }
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let ids: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

        let due = store
            .find_due_states("alice", &ids, DueWindow::due(now), 2)
            .await
            .unwrap();
        let due_ids: Vec<&str> = due.iter().map(|s| s.item_id.as_str()).collect();
        assert_eq!(due_ids, vec!["b", "c"]);

        let near = store
            .find_due_states("alice", &ids, DueWindow::near_due(now), 10)
            .await
            .unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].item_id, "d");
    }

    async fn catalog_item(store: &MemoryStore, id: &str, rank: u32) {
        store
            .insert_item(&Item {
                id: id.to_string(),
                book_id: 1,
                book_name: "Genesis".to_string(),
                testament: crate::store::Testament::Old,
                chapter: 1,
                verse: rank,
                global_rank: rank,
                global_difficulty: 500,
                released: true,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_count_mastered_uses_threshold_inclusively() {
        let store = MemoryStore::new();
        for (rank, id) in ["a", "b", "c"].iter().enumerate() {
            catalog_item(&store, id, rank as u32 + 1).await;
        }
        store.upsert_state(&state("a", 0.7, 1)).await.unwrap();
        store.upsert_state(&state("b", 0.69, 1)).await.unwrap();
        store.upsert_state(&state("c", 1.0, 1)).await.unwrap();
        assert_eq!(store.count_mastered("alice", 0.7).await.unwrap(), 2);
        assert_eq!(store.count_mastered("bob", 0.7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_mastered_ignores_items_outside_catalog() {
        let store = MemoryStore::new();
        catalog_item(&store, "a", 1).await;
        store.upsert_state(&state("a", 0.9, 1)).await.unwrap();
        store.upsert_state(&state("ghost", 0.9, 1)).await.unwrap();

        assert_eq!(store.count_mastered("alice", 0.7).await.unwrap(), 1);
        assert!(store.find_item("ghost").await.unwrap().is_none());
        assert_eq!(store.find_item("a").await.unwrap().unwrap().global_rank, 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(
            store.find_progression("alice").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.verse_text("a", "NIV").await.is_err());

        store.set_available(true);
        assert!(store.find_progression("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_leaderboard_order_and_rank_count() {
        let store = MemoryStore::new();
        for (id, xp, level) in [("a", 250, 2), ("b", 900, 4), ("c", 300, 2)] {
            store
                .upsert_progression(&LearnerProgression {
                    learner_id: id.to_string(),
                    xp,
                    level,
                })
                .await
                .unwrap();
        }

        let board = store.leaderboard(10).await.unwrap();
        let order: Vec<&str> = board.iter().map(|s| s.learner_id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(store.count_ranked_above(2, 250).await.unwrap(), 2);
        assert_eq!(store.count_ranked_above(4, 900).await.unwrap(), 0);
    }
}
