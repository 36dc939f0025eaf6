//! Request and response data transfer objects for the REST API.
//!
//! All types derive `Serialize` and/or `Deserialize` for JSON marshalling via Axum.

use serde::{Deserialize, Serialize};
use smarttour_core::catalog::{Item, ItemId};
use smarttour_core::ratings::RawScore;
use smarttour_core::{ContentQuery, RecommendRequest};

/// Request body for `POST /recommend`.
///
/// A content query is formed when `category` or `state` is present; a
/// collaborative query when `user_id` is present.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendBody {
    pub category: Option<String>,
    pub state: Option<String>,
    pub user_id: Option<String>,
    pub top_n: Option<usize>,
    pub min_similarity: Option<f32>,
}

impl RecommendBody {
    /// Label used for the `mode` metric.
    pub fn mode(&self) -> &'static str {
        match (self.has_content_query(), self.user_id.is_some()) {
            (true, true) => "hybrid",
            (true, false) => "content",
            (false, true) => "collaborative",
            (false, false) => "none",
        }
    }

    fn has_content_query(&self) -> bool {
        self.category.is_some() || self.state.is_some()
    }

    pub fn into_request(self) -> RecommendRequest {
        let content = if self.has_content_query() {
            let mut query = ContentQuery::new(
                self.category.unwrap_or_default(),
                self.state.unwrap_or_default(),
            );
            query.min_similarity = self.min_similarity;
            Some(query)
        } else {
            None
        };
        RecommendRequest {
            content,
            user_id: self.user_id,
            top_n: self.top_n,
        }
    }
}

/// Request body for `POST /ratings`.
///
/// The score is taken as written (number or numeric text) and validated by
/// the engine, so a bad score is a 400 rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub user_id: String,
    pub item_id: ItemId,
    pub score: RawScore,
}

/// Response for `POST /ratings` and `GET /ratings/count`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

/// Query string for `GET /items/:id/similar`.
#[derive(Debug, Default, Deserialize)]
pub struct SimilarQuery {
    pub top_n: Option<usize>,
}

/// Response for `GET /items/:id`.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub aggregate_rating: Option<f32>,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            category: item.category.clone(),
            state: item.state.clone(),
            description: item.description.clone(),
            aggregate_rating: item.aggregate_rating,
        }
    }
}

/// Response for `POST /admin/compact`.
#[derive(Debug, Serialize)]
pub struct CompactResponse {
    pub message: String,
    pub ratings: usize,
}

/// Response for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub items: usize,
    pub ratings: usize,
    pub users: usize,
    pub durable: bool,
}
