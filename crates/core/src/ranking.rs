//! Scored items and deterministic top-k selection.

use crate::catalog::{Item, ItemId};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

/// An item with the score a scorer assigned to it.
///
/// For content scoring the score is a cosine similarity in [0, 1]; for
/// collaborative scoring it is a predicted rating in [1, 5].
#[derive(Debug, Clone)]
pub struct ScoredItem {
    /// The ranked item (shared reference into the catalog).
    pub item: Arc<Item>,
    /// Score (interpretation depends on the scorer).
    pub score: f32,
}

/// Uniform result row handed to callers, independent of the scorer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub state: String,
    pub aggregate_rating: Option<f32>,
    pub score: f32,
}

impl From<&ScoredItem> for RankedItem {
    fn from(scored: &ScoredItem) -> Self {
        Self {
            id: scored.item.id,
            name: scored.item.name.clone(),
            category: scored.item.category.clone(),
            state: scored.item.state.clone(),
            aggregate_rating: scored.item.aggregate_rating,
            score: scored.score,
        }
    }
}

/// Selects the `k` best `(position, score)` pairs.
///
/// Higher scores rank first; equal scores keep ascending `position`, so the
/// output is fully determined by the input. NaN scores are dropped.
pub fn top_k(scores: impl IntoIterator<Item = (usize, f32)>, k: usize) -> Vec<(usize, f32)> {
    if k == 0 {
        return Vec::new();
    }

    // Min-heap keyed on (score, later position first): the root is the entry to evict.
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f32>, Reverse<usize>)>> =
        BinaryHeap::with_capacity(k + 1);
    for (pos, score) in scores {
        if score.is_nan() {
            continue;
        }
        heap.push(Reverse((OrderedFloat(score), Reverse(pos))));
        if heap.len() > k {
            heap.pop();
        }
    }

    let mut results: Vec<(usize, f32)> = heap
        .into_iter()
        .map(|Reverse((s, Reverse(pos)))| (pos, s.0))
        .collect();
    results.sort_unstable_by(|a, b| compare_ranked(*a, *b));
    results
}

fn compare_ranked(a: (usize, f32), b: (usize, f32)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}
