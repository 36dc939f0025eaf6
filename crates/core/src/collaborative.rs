//! User-based collaborative filtering.
//!
//! [`CollaborativeModel::build`] turns the rating log into a sparse user×item
//! matrix and a dense user×user cosine similarity table. The model is
//! immutable; the facade replaces it wholesale after every change to the
//! rating store.
//!
//! **Scoring** for a target user `u` and an item `i` the user has not rated:
//! ```text
//! score(u, i) = Σ r(n, i) · sim(u, n) / Σ sim(u, n)
//! ```
//! summed over neighbours `n` that rated `i`. Items without any weight are not
//! ranked at all.

use crate::catalog::{Catalog, ItemId};
use crate::ranking::{top_k, ScoredItem};
use crate::ratings::Rating;
use crate::similarity::{cosine_with_norms, SparseVector};
use std::collections::HashMap;
use std::sync::Arc;

/// Derived rating matrix and user similarity table.
#[derive(Debug, Clone, Default)]
pub struct CollaborativeModel {
    /// Users in first-seen order.
    users: Vec<String>,
    user_index: HashMap<String, usize>,
    /// Item ids in first-seen order; the position is the matrix column.
    item_columns: HashMap<ItemId, u32>,
    /// One row per user; absent cells are unrated.
    rows: Vec<SparseVector>,
    /// Row-major `users × users` cosine similarities.
    similarity: Vec<f32>,
}

impl CollaborativeModel {
    /// Builds the matrix and similarity table from a rating log.
    ///
    /// For duplicate `(user, item)` pairs the latest rating wins.
    pub fn build(ratings: &[Rating]) -> Self {
        let mut users: Vec<String> = Vec::new();
        let mut user_index: HashMap<String, usize> = HashMap::new();
        let mut item_columns: HashMap<ItemId, u32> = HashMap::new();
        let mut cells: Vec<HashMap<u32, f32>> = Vec::new();

        for rating in ratings {
            let row = *user_index.entry(rating.user_id.clone()).or_insert_with(|| {
                users.push(rating.user_id.clone());
                cells.push(HashMap::new());
                users.len() - 1
            });
            let next_column = item_columns.len() as u32;
            let column = *item_columns.entry(rating.item_id).or_insert(next_column);
            cells[row].insert(column, rating.score as f32);
        }

        let rows: Vec<SparseVector> = cells
            .into_iter()
            .map(|cells| SparseVector::from_pairs(cells.into_iter().collect()))
            .collect();
        let similarity = similarity_table(&rows);

        tracing::debug!(
            users = users.len(),
            items = item_columns.len(),
            ratings = ratings.len(),
            "Collaborative model rebuilt"
        );

        Self {
            users,
            user_index,
            item_columns,
            rows,
            similarity,
        }
    }

    /// Ranks catalog items the user has not rated.
    ///
    /// Unknown users get an empty list. With `max_neighbors` set, only the
    /// `k` most similar users contribute. Ties keep catalog order.
    pub fn score(
        &self,
        user_id: &str,
        catalog: &Catalog,
        top_n: usize,
        max_neighbors: Option<usize>,
    ) -> Vec<ScoredItem> {
        let Some(&target) = self.user_index.get(user_id) else {
            return Vec::new();
        };
        let neighbors = self.neighbor_indices(target, max_neighbors);
        let target_row = &self.rows[target];

        let scores = catalog.iter().enumerate().filter_map(|(pos, item)| {
            let &column = self.item_columns.get(&item.id)?;
            if target_row.get(column) != 0.0 {
                return None;
            }
            let mut weighted = 0.0f32;
            let mut weight = 0.0f32;
            for &(neighbor, sim) in &neighbors {
                let rating = self.rows[neighbor].get(column);
                if rating != 0.0 {
                    weighted += rating * sim;
                    weight += sim;
                }
            }
            (weight > 0.0).then(|| (pos, weighted / weight))
        });

        top_k(scores, top_n)
            .into_iter()
            .filter_map(|(pos, score)| {
                catalog.at(pos).map(|item| ScoredItem {
                    item: Arc::clone(item),
                    score,
                })
            })
            .collect()
    }

    /// Other users with positive similarity, most similar first, ties in user order.
    fn neighbor_indices(&self, target: usize, limit: Option<usize>) -> Vec<(usize, f32)> {
        let candidates = (0..self.users.len())
            .filter(|&other| other != target)
            .map(|other| (other, self.sim_at(target, other)))
            .filter(|&(_, sim)| sim > 0.0);
        top_k(candidates, limit.unwrap_or(self.users.len()))
    }

    fn sim_at(&self, a: usize, b: usize) -> f32 {
        self.similarity[a * self.users.len() + b]
    }

    /// Cosine similarity of two users' rating vectors.
    pub fn similarity(&self, a: &str, b: &str) -> Option<f32> {
        let a = *self.user_index.get(a)?;
        let b = *self.user_index.get(b)?;
        Some(self.sim_at(a, b))
    }

    /// The `k` users most similar to `user_id` with their similarity.
    pub fn neighbors(&self, user_id: &str, k: usize) -> Vec<(&str, f32)> {
        let Some(&target) = self.user_index.get(user_id) else {
            return Vec::new();
        };
        self.neighbor_indices(target, Some(k))
            .into_iter()
            .map(|(idx, sim)| (self.users[idx].as_str(), sim))
            .collect()
    }

    /// Returns `true` if the user has at least one rating.
    pub fn contains_user(&self, user_id: &str) -> bool {
        self.user_index.contains_key(user_id)
    }

    /// Number of distinct users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of distinct rated items.
    pub fn item_count(&self) -> usize {
        self.item_columns.len()
    }
}

/// Dense symmetric cosine table with a unit diagonal.
fn similarity_table(rows: &[SparseVector]) -> Vec<f32> {
    let n = rows.len();
    let norms: Vec<f32> = rows.iter().map(SparseVector::norm).collect();
    let mut table = vec![0.0f32; n * n];
    for i in 0..n {
        table[i * n + i] = 1.0;
        for j in (i + 1)..n {
            let sim = cosine_with_norms(&rows[i], norms[i], &rows[j], norms[j]);
            table[i * n + j] = sim;
            table[j * n + i] = sim;
        }
    }
    table
}
