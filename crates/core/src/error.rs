//! Error type shared by every fallible operation in the core crate.

use crate::catalog::ItemId;
use crate::config;
use std::io;
use thiserror::Error;

/// Errors returned by the recommendation engine.
///
/// Unknown users and empty tables are not errors: they produce empty
/// recommendation lists.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// Score outside the accepted range or not a number. The rating store is unchanged.
    #[error(
        "invalid rating '{0}': score must be an integer between {min} and {max}",
        min = config::MIN_RATING,
        max = config::MAX_RATING
    )]
    InvalidRating(String),
    /// Blank or oversized user id.
    #[error("invalid user id: {0}")]
    InvalidUser(String),
    /// Rating refers to an item that is not in the catalog.
    #[error("item {0} not found in catalog")]
    UnknownItem(ItemId),
    /// Source row missing a required field.
    #[error("malformed row: {0}")]
    MalformedRow(String),
    /// Recommendation request names neither a content query nor a user.
    #[error("request must contain a content query, a user id, or both")]
    EmptyQuery,
    /// WAL or snapshot I/O failure.
    #[error("storage error: {0}")]
    Storage(#[from] io::Error),
}

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, RecommendError>;
