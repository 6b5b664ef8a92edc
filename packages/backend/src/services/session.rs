//! Session composition
//!
//! Blends due reviews, near-due reviews and gated new introductions into one
//! practice set, falling back to a random sample of the filter universe when
//! every bucket is empty.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use learnbible_algo::session::sort_easiest_first;
use learnbible_algo::{
    filter_unlocked_pool, pool_size, sample_fallback, BucketPicker, SessionAllocation,
    MASTERY_THRESHOLD,
};

use super::ServiceError;
use crate::store::{
    ContentProvider, DueWindow, GameQuestion, Item, ItemFilters, Question, QuestionKind,
    RecordStore, StoreError,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub due: usize,
    pub near_due: usize,
    pub new: usize,
    pub fallback: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedSession {
    pub questions: Vec<GameQuestion>,
    pub allocation: SessionAllocation,
    pub picked: BucketCounts,
}

fn item_ids(items: &[Item]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}

/// Released items of `universe` inside the learner's unlocked pool
async fn unlocked_pool(
    store: &dyn RecordStore,
    learner_id: &str,
    universe: &[Item],
) -> Result<Vec<Item>, StoreError> {
    let mastered = store.count_mastered(learner_id, MASTERY_THRESHOLD).await?;
    let released: Vec<Item> = universe.iter().filter(|i| i.released).cloned().collect();
    Ok(filter_unlocked_pool(&released, pool_size(mastered)))
}

pub async fn compose_session<R>(
    store: &dyn RecordStore,
    content: &dyn ContentProvider,
    learner_id: &str,
    filters: &ItemFilters,
    target: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<ComposedSession, ServiceError>
where
    R: Rng + Send,
{
    let allocation = SessionAllocation::for_target(target);

    let universe = store.find_items(filters).await?;
    if universe.is_empty() {
        return Err(ServiceError::NoEligibleContent);
    }
    let universe_ids = item_ids(&universe);

    let (due, near_due, unlocked, started) = tokio::try_join!(
        store.find_due_states(learner_id, &universe_ids, DueWindow::due(now), allocation.due),
        store.find_due_states(
            learner_id,
            &universe_ids,
            DueWindow::near_due(now),
            allocation.near_due,
        ),
        unlocked_pool(store, learner_id, &universe),
        store.started_item_ids(learner_id, &universe_ids),
    )?;

    let mut picker = BucketPicker::new();
    let mut picked = BucketCounts {
        due: picker.fill(due.into_iter().map(|s| s.item_id), allocation.due),
        ..BucketCounts::default()
    };
    picked.near_due = picker.fill(near_due.into_iter().map(|s| s.item_id), allocation.near_due);

    let mut fresh: Vec<Item> = unlocked
        .into_iter()
        .filter(|item| !started.contains(&item.id))
        .collect();
    sort_easiest_first(&mut fresh, |item| item.global_difficulty);
    picked.new = picker.fill(fresh.into_iter().map(|item| item.id), allocation.new);

    let selected = if picker.is_empty() {
        let sample = sample_fallback(&universe_ids, target, rng);
        picked.fallback = sample.len();
        tracing::debug!(
            learner_id = %learner_id,
            universe = universe.len(),
            sampled = sample.len(),
            "all session buckets empty, using random fallback"
        );
        sample
    } else {
        picker.into_vec()
    };

    let questions = resolve_questions(
        store,
        content,
        &universe,
        &selected,
        &filters.translation_id,
    )
    .await?;

    tracing::debug!(
        learner_id = %learner_id,
        target,
        due = picked.due,
        near_due = picked.near_due,
        new = picked.new,
        fallback = picked.fallback,
        resolved = questions.len(),
        "session composed"
    );

    Ok(ComposedSession {
        questions,
        allocation,
        picked,
    })
}

/// Resolves each selected item to its earliest playable question in the
/// requested translation, keeping selection order. A question whose payload
/// does not parse gives way to the item's next one. Items without a question,
/// verse text or any playable payload are dropped.
pub async fn resolve_questions(
    store: &dyn RecordStore,
    content: &dyn ContentProvider,
    universe: &[Item],
    selected: &[String],
    translation_id: &str,
) -> Result<Vec<GameQuestion>, ServiceError> {
    if selected.is_empty() {
        return Ok(Vec::new());
    }

    let items: HashMap<&str, &Item> = universe.iter().map(|i| (i.id.as_str(), i)).collect();

    let mut candidates: HashMap<String, Vec<Question>> = HashMap::new();
    for question in store.find_questions(selected, translation_id, None).await? {
        candidates
            .entry(question.item_id.clone())
            .or_default()
            .push(question);
    }

    let playable: Vec<(&Item, &[Question])> = selected
        .iter()
        .filter_map(|id| {
            let item = items.get(id.as_str())?;
            match candidates.get(id) {
                Some(questions) => Some((*item, questions.as_slice())),
                None => {
                    tracing::debug!(item_id = %id, translation_id, "no active question for item");
                    None
                }
            }
        })
        .collect();

    // every candidate shares the requested translation, so one text per item
    let texts = try_join_all(
        playable
            .iter()
            .map(|(item, _)| content.verse_text(&item.id, translation_id)),
    )
    .await?;

    let mut resolved = Vec::with_capacity(playable.len());
    for ((item, questions), text) in playable.into_iter().zip(texts) {
        let Some(text) = text else {
            tracing::debug!(item_id = %item.id, translation_id, "no verse text, dropping question");
            continue;
        };
        let game = questions.iter().find_map(|question| {
            GameQuestion::resolve(question, item, text.clone())
                .map_err(|err| tracing::warn!(error = %err, "skipping malformed question"))
                .ok()
        });
        match game {
            Some(game) => resolved.push(game),
            None => tracing::debug!(item_id = %item.id, "no playable question for item"),
        }
    }

    Ok(resolved)
}

/// Single-question mode: one random BLANKS question from the unlocked pool
pub async fn random_question<R>(
    store: &dyn RecordStore,
    content: &dyn ContentProvider,
    learner_id: &str,
    filters: &ItemFilters,
    exclude_question_id: Option<&str>,
    rng: &mut R,
) -> Result<GameQuestion, ServiceError>
where
    R: Rng + Send,
{
    let universe = store.find_items(filters).await?;
    if universe.is_empty() {
        return Err(ServiceError::NoEligibleContent);
    }

    let pool = unlocked_pool(store, learner_id, &universe).await?;
    if pool.is_empty() {
        return Err(ServiceError::NoEligibleContent);
    }

    let mut candidates: Vec<Question> = store
        .find_questions(
            &item_ids(&pool),
            &filters.translation_id,
            Some(QuestionKind::Blanks),
        )
        .await?
        .into_iter()
        .filter(|q| Some(q.id.as_str()) != exclude_question_id)
        .collect();
    candidates.shuffle(rng);

    let items: HashMap<&str, &Item> = pool.iter().map(|i| (i.id.as_str(), i)).collect();
    for question in &candidates {
        let Some(item) = items.get(question.item_id.as_str()) else {
            continue;
        };
        let Some(text) = content
            .verse_text(&item.id, &question.translation_id)
            .await?
        else {
            continue;
        };
        match GameQuestion::resolve(question, item, text) {
            Ok(game) => return Ok(game),
            Err(err) => tracing::warn!(error = %err, "skipping malformed question"),
        }
    }

    Err(ServiceError::NoEligibleContent)
}
