//! TF-IDF vectorizer producing sparse, L2-normalized term vectors.
//!
//! **Weighting:**
//! ```text
//! tfidf(t, d) = tf(t, d) × idf(t)
//! tf(t, d)    = count of term t in document d
//! idf(t)      = ln((1 + N) / (1 + df(t))) + 1
//! ```
//! where N is the number of fitted documents and df(t) the number of those
//! documents containing t. Every row is scaled to unit length, so the dot
//! product of two rows is their cosine similarity.
//!
//! The vocabulary is fixed by [`TfidfVectorizer::fit`]; terms first seen at
//! transform time are ignored.

use crate::similarity::SparseVector;
use crate::text::tokenizer::tokenize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Fitted TF-IDF model: vocabulary and per-term inverse document frequencies.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    /// term → column index. Columns follow lexicographic term order.
    vocabulary: HashMap<String, u32>,
    /// Indexed by column.
    idf: Vec<f32>,
    document_count: usize,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and idf weights from a corpus.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            let unique: HashSet<&str> = tokens.iter().collect();
            for term in unique {
                *doc_freq.entry(term.to_string()).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f32;
        let mut vocabulary = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (column, (term, df)) in doc_freq.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f32)).ln() + 1.0);
            vocabulary.insert(term, column as u32);
        }

        tracing::debug!(
            documents = documents.len(),
            vocabulary = vocabulary.len(),
            "TF-IDF vocabulary fitted"
        );

        Self {
            vocabulary,
            idf,
            document_count: documents.len(),
        }
    }

    /// Fits on the corpus and returns the vectorizer with one row per document.
    pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> (Self, Vec<SparseVector>) {
        let vectorizer = Self::fit(documents);
        let rows = documents
            .iter()
            .map(|doc| vectorizer.transform(doc.as_ref()))
            .collect();
        (vectorizer, rows)
    }

    /// Transforms text with the fitted vocabulary into a unit-length vector.
    ///
    /// Text without any known term yields the zero vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let tokens = tokenize(text);
        let mut counts: HashMap<u32, f32> = HashMap::new();
        for token in tokens.iter() {
            if let Some(&column) = self.vocabulary.get(token) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(column, tf)| (column, tf * self.idf[column as usize]))
            .collect();
        let mut vector = SparseVector::from_pairs(pairs);
        vector.normalize();
        vector
    }

    /// Number of distinct terms in the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Number of documents the vectorizer was fitted on.
    pub fn document_count(&self) -> usize {
        self.document_count
    }

    /// Inverse document frequency of a term, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary
            .get(term)
            .map(|&column| self.idf[column as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine;

    #[test]
    fn test_fit_builds_vocabulary_without_stop_words() {
        let v = TfidfVectorizer::fit(&["beach in kedah", "nature of kedah"]);
        assert_eq!(v.vocabulary_size(), 3);
        assert!(v.idf("beach").is_some());
        assert!(v.idf("in").is_none());
        assert_eq!(v.document_count(), 2);
    }

    #[test]
    fn test_smoothed_idf_values() {
        let v = TfidfVectorizer::fit(&["beach kedah", "nature kedah"]);
        // kedah is in every document: ln(3/3) + 1
        assert!((v.idf("kedah").unwrap() - 1.0).abs() < 1e-6);
        // beach is in one of two: ln(3/2) + 1
        let expected = (3.0f32 / 2.0).ln() + 1.0;
        assert!((v.idf("beach").unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_rows_are_unit_length() {
        let (_, rows) = TfidfVectorizer::fit_transform(&["beach kedah", "nature nature kedah"]);
        for row in &rows {
            assert!((row.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_transform_ignores_unknown_terms() {
        let v = TfidfVectorizer::fit(&["beach kedah"]);
        assert!(v.transform("volcano").is_empty());
        let partial = v.transform("beach volcano");
        assert_eq!(partial.nnz(), 1);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let (v, rows) = TfidfVectorizer::fit_transform(&["beach kedah", "island langkawi kedah"]);
        assert_eq!(v.transform("beach kedah"), rows[0]);
        assert_eq!(v.transform("beach kedah"), v.transform("beach kedah"));
    }

    #[test]
    fn test_query_matches_its_document_best() {
        let (v, rows) = TfidfVectorizer::fit_transform(&["beach kedah", "nature kedah"]);
        let q = v.transform("beach kedah");
        assert!(cosine(&q, &rows[0]) > cosine(&q, &rows[1]));
        assert!((cosine(&q, &rows[0]) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_corpus() {
        let docs: [&str; 0] = [];
        let v = TfidfVectorizer::fit(&docs);
        assert_eq!(v.vocabulary_size(), 0);
        assert!(v.transform("beach").is_empty());
    }
}
