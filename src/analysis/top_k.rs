//! Bounded top-k selection.
//!
//! Keeps a min-heap of at most `k` entries while scanning the input once, so
//! selection is O(n log k) rather than a full sort. Among equal counts the
//! entry seen earlier in the input ranks higher.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A candidate in the heap. Greater means "ranks higher".
struct Ranked<K, C> {
    count: C,
    seq: usize,
    key: K,
}

impl<K, C: Ord> Ord for Ranked<K, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<K, C: Ord> PartialOrd for Ranked<K, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K, C: Ord> PartialEq for Ranked<K, C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K, C: Ord> Eq for Ranked<K, C> {}

/// Return the `k` entries with the highest counts, highest first.
///
/// Returns fewer than `k` entries when the input is shorter. Ties keep input
/// order, so feeding entries in first-seen order makes the result
/// deterministic.
pub fn top_k<K, C, I>(entries: I, k: usize) -> Vec<(K, C)>
where
    I: IntoIterator<Item = (K, C)>,
    C: Ord,
{
    if k == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Reverse<Ranked<K, C>>> = BinaryHeap::with_capacity(k + 1);

    for (seq, (key, count)) in entries.into_iter().enumerate() {
        let candidate = Ranked { count, seq, key };
        if heap.len() < k {
            heap.push(Reverse(candidate));
            continue;
        }
        let beats_weakest = heap
            .peek()
            .is_some_and(|Reverse(weakest)| candidate > *weakest);
        if beats_weakest {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    // Ascending order of Reverse is descending rank.
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(r)| (r.key, r.count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_k_is_empty() {
        assert!(top_k(vec![("a", 1)], 0).is_empty());
    }

    #[test]
    fn later_higher_count_evicts_weakest() {
        let got = top_k(vec![("a", 1), ("b", 2), ("c", 9), ("d", 5)], 2);
        assert_eq!(got, vec![("c", 9), ("d", 5)]);
    }
}
