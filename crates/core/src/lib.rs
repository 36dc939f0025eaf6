//! # smarttour-core
//!
//! Recommendation engine for tourist destinations. Two independent scorers
//! rank catalog items:
//!
//! - a content scorer comparing TF-IDF vectors of category/state text,
//! - a user-based collaborative scorer over a sparse rating matrix.
//!
//! The [`Recommender`] facade routes requests to either or both. Ratings are
//! kept in an append-only store backed by a write-ahead log and snapshots.
//!
//! The crate is synchronous and has no async dependencies.

/// Destination catalog: items, loosely-typed input rows, lookups.
pub mod catalog;
/// User-based collaborative filtering model.
pub mod collaborative;
/// Global configuration constants: rating bounds, limits, file names, defaults.
pub mod config;
/// Content scorer over TF-IDF item vectors.
pub mod content;
pub mod error;
/// Scored items and deterministic top-k selection.
pub mod ranking;
/// Rating records, write-ahead log, snapshots and the rating store.
pub mod ratings;
/// Hybrid ranking facade.
pub mod recommender;
/// Sparse vectors and cosine similarity.
pub mod similarity;
/// Tokenizer and TF-IDF vectorizer.
pub mod text;

pub use catalog::{Catalog, CatalogRow, Item, ItemId, LoadStats};
pub use content::ContentQuery;
pub use error::{RecommendError, Result};
pub use ranking::RankedItem;
pub use ratings::{ImportStats, RatingStore, RawRating, Rating};
pub use recommender::{RecommendRequest, RecommendResponse, Recommender, RecommenderConfig, Stats};
