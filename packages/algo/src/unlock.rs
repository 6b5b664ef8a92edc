//! Unlock Gate
//!
//! Paces the introduction of new items. A learner starts with
//! [`BASE_POOL_SIZE`] unlocked items and earns one more per mastered item.
//! The gate only governs never-seen items; started items stay reviewable
//! regardless of pool size.

use std::collections::BTreeMap;

use crate::types::BASE_POOL_SIZE;

/// Anything carrying a global unlock rank (1 = first)
pub trait Ranked {
    fn global_rank(&self) -> u32;
}

pub fn pool_size(mastered_count: u32) -> u32 {
    BASE_POOL_SIZE.saturating_add(mastered_count)
}

/// Items whose rank is within the pool, in input order.
///
/// Ranks are expected to be unique; items sharing a rank within the pool are
/// all kept.
pub fn filter_unlocked_pool<T: Ranked + Clone>(catalog: &[T], pool_size: u32) -> Vec<T> {
    catalog
        .iter()
        .filter(|item| item.global_rank() <= pool_size)
        .cloned()
        .collect()
}

/// Ranks used by more than one item, ascending
pub fn duplicate_ranks<T: Ranked>(catalog: &[T]) -> Vec<u32> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for item in catalog {
        *counts.entry(item.global_rank()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(rank, _)| rank)
        .collect()
}
