//! Reference distractors
//!
//! Wrong answers for the "which reference is this verse?" phase: other
//! catalog verses that have text in the requested translation, topped up
//! with well-known references when the catalog is too small.

use futures::future::try_join_all;
use rand::seq::SliceRandom;
use rand::Rng;

use super::ServiceError;
use crate::store::{ContentProvider, ItemFilters, RecordStore};

pub const DEFAULT_DISTRACTORS: usize = 2;
pub const MAX_DISTRACTORS: usize = 10;

/// Catalog verses inspected per request
pub const CANDIDATE_LIMIT: usize = 50;

pub const FALLBACK_REFERENCES: [&str; 2] = ["Genesis 1:1", "Revelation 22:21"];

/// Up to `count` distinct references, none equal to the item's own
pub async fn reference_distractors<R>(
    store: &dyn RecordStore,
    content: &dyn ContentProvider,
    item_id: &str,
    translation_id: &str,
    count: usize,
    rng: &mut R,
) -> Result<Vec<String>, ServiceError>
where
    R: Rng + Send,
{
    if count == 0 || count > MAX_DISTRACTORS {
        return Err(ServiceError::validation(format!(
            "count must be between 1 and {MAX_DISTRACTORS}"
        )));
    }
    let Some(item) = store.find_item(item_id).await? else {
        return Err(ServiceError::validation(format!("unknown item: {item_id}")));
    };
    let own_reference = item.reference();

    let mut candidates: Vec<_> = store
        .find_items(&ItemFilters::all_books(translation_id))
        .await?
        .into_iter()
        .filter(|candidate| candidate.id != item.id)
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(CANDIDATE_LIMIT);

    let texts = try_join_all(
        candidates
            .iter()
            .map(|candidate| content.verse_text(&candidate.id, translation_id)),
    )
    .await?;

    let mut distractors: Vec<String> = Vec::with_capacity(count);
    let with_text = candidates
        .iter()
        .zip(texts)
        .filter(|(_, text)| text.is_some())
        .map(|(candidate, _)| candidate.reference());
    let fallbacks = FALLBACK_REFERENCES.iter().map(|r| r.to_string());
    for reference in with_text.chain(fallbacks) {
        if distractors.len() == count {
            break;
        }
        if reference != own_reference && !distractors.contains(&reference) {
            distractors.push(reference);
        }
    }

    tracing::debug!(
        item_id = %item_id,
        translation_id,
        requested = count,
        returned = distractors.len(),
        "reference distractors"
    );

    Ok(distractors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Item, MemoryStore, Testament};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn verse(id: &str, book_name: &str, chapter: u32, verse: u32, rank: u32) -> Item {
        Item {
            id: id.to_string(),
            book_id: 1,
            book_name: book_name.to_string(),
            testament: Testament::Old,
            chapter,
            verse,
            global_rank: rank,
            global_difficulty: 500,
            released: true,
        }
    }

    async fn store_with(items: &[Item], with_text: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for item in items {
            store.insert_item(item).await.unwrap();
        }
        for id in with_text {
            store.insert_verse_text(id, "NIV", "text").await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_count_is_bounded() {
        let store = store_with(&[verse("a", "Genesis", 2, 1, 1)], &[]).await;
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for count in [0, MAX_DISTRACTORS + 1] {
            let err = reference_distractors(&store, &store, "a", "NIV", count, &mut rng)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_small_catalog_tops_up_with_fallbacks() {
        let items = [verse("a", "Genesis", 2, 1, 1), verse("b", "Exodus", 3, 14, 2)];
        let store = store_with(&items, &["a", "b"]).await;
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let picked = reference_distractors(&store, &store, "a", "NIV", 3, &mut rng)
            .await
            .unwrap();

        assert_eq!(picked, vec!["Exodus 3:14", "Genesis 1:1", "Revelation 22:21"]);
    }

    #[tokio::test]
    async fn test_fallback_never_repeats_own_reference() {
        let items = [verse("gen-1-1", "Genesis", 1, 1, 1)];
        let store = store_with(&items, &["gen-1-1"]).await;
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let picked = reference_distractors(&store, &store, "gen-1-1", "NIV", 2, &mut rng)
            .await
            .unwrap();

        assert_eq!(picked, vec!["Revelation 22:21"]);
    }
}
