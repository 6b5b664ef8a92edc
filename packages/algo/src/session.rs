//! Session Blending
//!
//! Splits a session of `target` questions into due / near-due / new buckets
//! (60% / 30% / remainder), fills the buckets in precedence order without
//! duplicates, and samples a random fallback when every bucket comes up empty.

use std::collections::HashSet;
use std::hash::Hash;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{DUE_SHARE_TENTHS, NEAR_DUE_SHARE_TENTHS};
use crate::unlock::Ranked;

/// Per-bucket targets; always sums to the requested session size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAllocation {
    pub due: usize,
    pub near_due: usize,
    pub new: usize,
}

impl SessionAllocation {
    pub fn for_target(target: usize) -> Self {
        let due = target * DUE_SHARE_TENTHS / 10;
        let near_due = target * NEAR_DUE_SHARE_TENTHS / 10;
        Self {
            due,
            near_due,
            new: target - due - near_due,
        }
    }

    pub fn total(&self) -> usize {
        self.due + self.near_due + self.new
    }
}

/// Ordered, duplicate-free accumulator for bucket picks
#[derive(Debug, Clone)]
pub struct BucketPicker<K> {
    picked: Vec<K>,
    seen: HashSet<K>,
}

impl<K: Eq + Hash + Clone> BucketPicker<K> {
    pub fn new() -> Self {
        Self {
            picked: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Adds up to `limit` candidates not already picked; returns how many
    /// were added.
    pub fn fill<I>(&mut self, candidates: I, limit: usize) -> usize
    where
        I: IntoIterator<Item = K>,
    {
        let mut added = 0;
        for key in candidates {
            if added >= limit {
                break;
            }
            if self.seen.insert(key.clone()) {
                self.picked.push(key);
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, key: &K) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.picked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picked.is_empty()
    }

    pub fn into_vec(self) -> Vec<K> {
        self.picked
    }
}

impl<K: Eq + Hash + Clone> Default for BucketPicker<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Orders new-item candidates easiest first; equal difficulty falls back to
/// unlock rank.
pub fn sort_easiest_first<T, F>(items: &mut [T], difficulty: F)
where
    T: Ranked,
    F: Fn(&T) -> u32,
{
    items.sort_by(|a, b| {
        difficulty(a)
            .cmp(&difficulty(b))
            .then_with(|| a.global_rank().cmp(&b.global_rank()))
    });
}

/// Uniform random sample of up to `count` entries, without replacement
pub fn sample_fallback<T, R>(universe: &[T], count: usize, rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    universe.choose_multiple(rng, count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // ==================== SessionAllocation ====================

    #[test]
    fn test_allocation_for_ten() {
        let alloc = SessionAllocation::for_target(10);
        assert_eq!(alloc, SessionAllocation { due: 6, near_due: 3, new: 1 });
    }

    #[test]
    fn test_allocation_remainder_goes_to_new() {
        let alloc = SessionAllocation::for_target(7);
        assert_eq!(alloc.due, 4);
        assert_eq!(alloc.near_due, 2);
        assert_eq!(alloc.new, 1);

        let alloc = SessionAllocation::for_target(1);
        assert_eq!(alloc, SessionAllocation { due: 0, near_due: 0, new: 1 });

        let alloc = SessionAllocation::for_target(0);
        assert_eq!(alloc.total(), 0);
    }

    #[test]
    fn test_allocation_sums_to_target() {
        for target in 0..200 {
            assert_eq!(SessionAllocation::for_target(target).total(), target);
        }
    }

    // ==================== BucketPicker ====================

    #[test]
    fn test_picker_respects_limit_and_dedupes() {
        let mut picker = BucketPicker::new();
        assert_eq!(picker.fill(vec!["a", "b", "c"], 2), 2);
        assert_eq!(picker.fill(vec!["b", "c", "d"], 2), 2);
        assert_eq!(picker.into_vec(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_picker_excludes_before_limit() {
        let mut picker = BucketPicker::new();
        picker.fill(vec![1, 2], 2);
        // duplicates must not consume the limit
        assert_eq!(picker.fill(vec![1, 2, 3], 1), 1);
        assert!(picker.contains(&3));
        assert_eq!(picker.len(), 3);
    }

    #[test]
    fn test_picker_zero_limit() {
        let mut picker: BucketPicker<u32> = BucketPicker::default();
        assert_eq!(picker.fill(vec![1, 2, 3], 0), 0);
        assert!(picker.is_empty());
    }

    // ==================== ordering and sampling ====================

    struct Candidate {
        rank: u32,
        difficulty: u32,
    }

    impl Ranked for Candidate {
        fn global_rank(&self) -> u32 {
            self.rank
        }
    }

    #[test]
    fn test_sort_easiest_first_ties_by_rank() {
        let mut items = vec![
            Candidate { rank: 1, difficulty: 700 },
            Candidate { rank: 3, difficulty: 200 },
            Candidate { rank: 2, difficulty: 200 },
        ];
        sort_easiest_first(&mut items, |c| c.difficulty);
        let ranks: Vec<u32> = items.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![2, 3, 1]);
    }

    #[test]
    fn test_sample_fallback_bounded_and_unique() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let universe: Vec<u32> = (0..5).collect();
        let sample = sample_fallback(&universe, 10, &mut rng);
        assert_eq!(sample.len(), 5);
        let unique: HashSet<u32> = sample.iter().copied().collect();
        assert_eq!(unique.len(), 5);

        let sample = sample_fallback(&universe, 3, &mut rng);
        assert_eq!(sample.len(), 3);
        assert!(sample.iter().all(|v| universe.contains(v)));
    }

    #[test]
    fn test_sample_fallback_empty_universe() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let universe: Vec<u32> = Vec::new();
        assert!(sample_fallback(&universe, 10, &mut rng).is_empty());
    }
}
