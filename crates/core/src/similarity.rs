//! Sparse vectors and cosine similarity.
//!
//! Both scorers work on sparse vectors: content vectors over the TF-IDF
//! vocabulary and user rating vectors over the rated items. Indices are kept
//! sorted so dot products are a single merge pass.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Norms below this are treated as zero vectors.
const NORM_EPSILON: f32 = 1e-10;

/// Sparse f32 vector with strictly increasing indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Builds a vector from `(index, value)` pairs.
    ///
    /// Pairs are sorted by index; values for a repeated index are summed and
    /// explicit zeros are dropped.
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.sort_unstable_by_key(|&(idx, _)| idx);
        let mut indices: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f32> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            if indices.last() == Some(&idx) {
                if let Some(last) = values.last_mut() {
                    *last += value;
                }
            } else {
                indices.push(idx);
                values.push(value);
            }
        }
        let mut v = Self { indices, values };
        v.drop_zeros();
        v
    }

    fn drop_zeros(&mut self) {
        if self.values.iter().all(|&x| x != 0.0) {
            return;
        }
        let (indices, values) = self
            .indices
            .iter()
            .zip(&self.values)
            .filter(|&(_, &x)| x != 0.0)
            .map(|(&i, &x)| (i, x))
            .unzip();
        self.indices = indices;
        self.values = values;
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if every component is zero.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Value at `index`, zero when absent.
    pub fn get(&self, index: u32) -> f32 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Iterates stored `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Euclidean (L2) norm.
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Scales the vector to unit length. Zero vectors are left unchanged.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm < NORM_EPSILON {
            return;
        }
        for v in &mut self.values {
            *v /= norm;
        }
    }

    /// Dot product by merging the two index lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Cosine similarity of two sparse vectors. Zero vectors have similarity 0.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f32 {
    cosine_with_norms(a, a.norm(), b, b.norm())
}

/// Cosine similarity with precomputed norms.
pub fn cosine_with_norms(a: &SparseVector, norm_a: f32, b: &SparseVector, norm_b: f32) -> f32 {
    let denom = norm_a * norm_b;
    if denom < NORM_EPSILON {
        return 0.0;
    }
    a.dot(b) / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sv(pairs: &[(u32, f32)]) -> SparseVector {
        SparseVector::from_pairs(pairs.to_vec())
    }

    #[test]
    fn test_from_pairs_sorts_and_merges() {
        let v = sv(&[(3, 1.0), (1, 2.0), (3, 0.5)]);
        let pairs: Vec<(u32, f32)> = v.iter().collect();
        assert_eq!(pairs, vec![(1, 2.0), (3, 1.5)]);
    }

    #[test]
    fn test_from_pairs_drops_zeros() {
        let v = sv(&[(0, 0.0), (2, 1.0), (4, 1.0), (4, -1.0)]);
        assert_eq!(v.nnz(), 1);
        assert_eq!(v.get(2), 1.0);
        assert_eq!(v.get(4), 0.0);
    }

    #[test]
    fn test_dot_disjoint_is_zero() {
        let a = sv(&[(0, 1.0), (2, 1.0)]);
        let b = sv(&[(1, 1.0), (3, 1.0)]);
        assert_eq!(a.dot(&b), 0.0);
    }

    #[test]
    fn test_cosine_identical() {
        let a = sv(&[(0, 1.0), (5, 2.0), (9, 3.0)]);
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_known_value() {
        // [5, 3] vs [4, 0]: 20 / (sqrt(34) * 4)
        let a = sv(&[(0, 5.0), (1, 3.0)]);
        let b = sv(&[(0, 4.0)]);
        let expected = 20.0 / (34.0f32.sqrt() * 4.0);
        assert!((cosine(&a, &b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let a = SparseVector::default();
        let b = sv(&[(0, 1.0)]);
        assert_eq!(cosine(&a, &b), 0.0);
        assert_eq!(cosine(&a, &a), 0.0);
    }

    #[test]
    fn test_normalize_unit_length() {
        let mut v = sv(&[(0, 3.0), (1, 4.0)]);
        v.normalize();
        assert!((v.norm() - 1.0).abs() < 1e-6);
        assert!((v.get(0) - 0.6).abs() < 1e-6);

        let mut zero = SparseVector::default();
        zero.normalize();
        assert!(zero.is_empty());
    }
}
