//! Text processing for content features: tokenization and TF-IDF weighting.

/// TF-IDF vectorizer over a fixed, catalog-wide vocabulary.
pub mod tfidf;
/// Stop-word filtering tokenizer.
pub mod tokenizer;

pub use tfidf::TfidfVectorizer;
pub use tokenizer::tokenize;
