//! Rating store: validated ratings, write-ahead log and snapshots.

pub mod rating;
pub mod snapshot;
pub mod store;
pub mod wal;

pub use rating::{parse_score, validate_score, RawRating, RawScore, Rating};
pub use store::{ImportStats, RatingStore};
pub use wal::ReplayStats;
