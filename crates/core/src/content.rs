//! Content-based scoring over item text attributes.
//!
//! Every item gets one TF-IDF vector built from its category, state and
//! description. The vectorizer is fitted once over the whole catalog when the
//! scorer is built; queries are transformed with that fixed vocabulary and
//! ranked by cosine similarity.

use crate::catalog::{Catalog, ItemId};
use crate::ranking::{top_k, ScoredItem};
use crate::similarity::SparseVector;
use crate::text::TfidfVectorizer;
use std::sync::Arc;

/// A content preference: category and state tags, either may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentQuery {
    pub category: String,
    pub state: String,
    /// Results scoring below this similarity are dropped.
    pub min_similarity: Option<f32>,
}

impl ContentQuery {
    /// Creates a query for a category and state.
    pub fn new(category: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            state: state.into(),
            min_similarity: None,
        }
    }

    /// Sets a minimum similarity threshold.
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = Some(min_similarity);
        self
    }

    fn text(&self) -> String {
        format!("{} {}", self.category, self.state)
    }
}

/// Ranks catalog items by textual similarity to a query.
///
/// Immutable after construction; safe to share across threads.
#[derive(Debug)]
pub struct ContentScorer {
    catalog: Arc<Catalog>,
    vectorizer: TfidfVectorizer,
    /// Unit-length (or zero) vector per item, indexed by catalog position.
    vectors: Vec<SparseVector>,
}

impl ContentScorer {
    /// Fits the vectorizer on the catalog's feature text and vectorizes every item.
    pub fn build(catalog: Arc<Catalog>) -> Self {
        let documents: Vec<String> = catalog.iter().map(|item| item.feature_text()).collect();
        let (vectorizer, vectors) = TfidfVectorizer::fit_transform(&documents);
        tracing::info!(
            items = vectors.len(),
            vocabulary = vectorizer.vocabulary_size(),
            "Content vectors built"
        );
        Self {
            catalog,
            vectorizer,
            vectors,
        }
    }

    /// Ranks items against a category/state query.
    ///
    /// Returns at most `top_n` items by descending cosine similarity, ties in
    /// catalog order. Items with zero similarity are still ranked so a query
    /// with no known terms falls back to catalog order.
    pub fn score(&self, query: &ContentQuery, top_n: usize) -> Vec<ScoredItem> {
        let query_vector = self.vectorizer.transform(&query.text());
        let scores = self
            .vectors
            .iter()
            .enumerate()
            .map(|(pos, vector)| (pos, query_vector.dot(vector)))
            .filter(|&(_, score)| query.min_similarity.map_or(true, |min| score >= min));
        self.resolve(top_k(scores, top_n))
    }

    /// Ranks the items most similar to an existing item, excluding the item itself.
    ///
    /// Unknown ids yield an empty list.
    pub fn similar_items(&self, id: ItemId, top_n: usize) -> Vec<ScoredItem> {
        let Some(target) = self.catalog.position(id) else {
            return Vec::new();
        };
        let target_vector = &self.vectors[target];
        let scores = self
            .vectors
            .iter()
            .enumerate()
            .filter(|&(pos, _)| pos != target)
            .map(|(pos, vector)| (pos, target_vector.dot(vector)));
        self.resolve(top_k(scores, top_n))
    }

    /// The content vector of an item.
    pub fn vector(&self, id: ItemId) -> Option<&SparseVector> {
        self.catalog.position(id).map(|pos| &self.vectors[pos])
    }

    /// Number of distinct vocabulary terms.
    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    fn resolve(&self, ranked: Vec<(usize, f32)>) -> Vec<ScoredItem> {
        ranked
            .into_iter()
            .filter_map(|(pos, score)| {
                self.catalog.at(pos).map(|item| ScoredItem {
                    item: Arc::clone(item),
                    score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Item;

    fn scorer(items: Vec<Item>) -> ContentScorer {
        ContentScorer::build(Arc::new(Catalog::new(items)))
    }

    fn sample() -> ContentScorer {
        scorer(vec![
            Item::new(1, "Pantai Cenang", "beach", "kedah"),
            Item::new(2, "Gunung Jerai", "nature", "kedah"),
            Item::new(3, "Batu Ferringhi", "beach", "penang"),
            Item::new(4, "Penang Hill", "nature", "penang"),
            Item::new(5, "Aquaria", "museum", "kuala lumpur"),
        ])
    }

    #[test]
    fn test_beach_kedah_ranks_item_one_first() {
        let s = scorer(vec![
            Item::new(1, "A", "beach", "kedah"),
            Item::new(2, "B", "nature", "kedah"),
        ]);
        let results = s.score(&ContentQuery::new("beach", "kedah"), 5);
        assert_eq!(results[0].item.id, 1);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_results_bounded_and_sorted() {
        let s = sample();
        let results = s.score(&ContentQuery::new("beach", "penang"), 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].item.id, 3);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let s = sample();
        // "beach" alone: items 1 and 3 share the term with equal weight.
        let results = s.score(&ContentQuery::new("beach", ""), 2);
        let ids: Vec<ItemId> = results.iter().map(|r| r.item.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_unknown_terms_fall_back_to_catalog_order() {
        let s = sample();
        let results = s.score(&ContentQuery::new("", "sabah"), 3);
        let ids: Vec<ItemId> = results.iter().map(|r| r.item.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_min_similarity_filters() {
        let s = sample();
        let results = s.score(&ContentQuery::new("museum", "").with_min_similarity(0.1), 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.id, 5);
    }

    #[test]
    fn test_multi_word_state_matches() {
        let s = sample();
        let results = s.score(&ContentQuery::new("museum", "Kuala Lumpur"), 1);
        assert_eq!(results[0].item.id, 5);
    }

    #[test]
    fn test_empty_catalog() {
        let s = scorer(Vec::new());
        assert!(s.score(&ContentQuery::new("beach", "kedah"), 5).is_empty());
        assert!(s.similar_items(1, 5).is_empty());
    }

    #[test]
    fn test_vectors_stable_across_queries() {
        let s = sample();
        let before = s.vector(3).cloned();
        let _ = s.score(&ContentQuery::new("beach", "penang"), 5);
        let _ = s.score(&ContentQuery::new("nature", "kedah"), 5);
        assert_eq!(s.vector(3).cloned(), before);
        let first = s.score(&ContentQuery::new("beach", "penang"), 5);
        let second = s.score(&ContentQuery::new("beach", "penang"), 5);
        let a: Vec<(ItemId, f32)> = first.iter().map(|r| (r.item.id, r.score)).collect();
        let b: Vec<(ItemId, f32)> = second.iter().map(|r| (r.item.id, r.score)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_description_contributes_terms() {
        let s = scorer(vec![
            Item::new(1, "A", "nature", "sabah").with_description("mountain summit trek"),
            Item::new(2, "B", "nature", "sabah"),
        ]);
        let results = s.score(&ContentQuery::new("mountain", ""), 2);
        assert_eq!(results[0].item.id, 1);
        assert!(results[0].score > 0.0);
        assert_eq!(results[1].score, 0.0);
    }

    #[test]
    fn test_similar_items_excludes_self() {
        let s = sample();
        let results = s.similar_items(1, 4);
        assert!(results.iter().all(|r| r.item.id != 1));
        // Same category or same state share a term with item 1.
        let top: Vec<ItemId> = results.iter().take(2).map(|r| r.item.id).collect();
        assert!(top.contains(&2) && top.contains(&3));
    }

    #[test]
    fn test_similar_items_unknown_id() {
        assert!(sample().similar_items(99, 3).is_empty());
    }
}
