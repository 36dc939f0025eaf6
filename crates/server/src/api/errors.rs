//! API error types mapped to HTTP status codes.
//!
//! Each [`ApiError`] variant maps to a specific HTTP status code and produces
//! a JSON response body `{"error": "message"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use smarttour_core::RecommendError;

/// Application-level error type that implements `IntoResponse`.
///
/// - `BadRequest` → 400
/// - `NotFound` → 404
/// - `Internal` → 500
#[derive(Debug)]
pub enum ApiError {
    /// Invalid request parameters (400).
    BadRequest(String),
    /// Resource not found (404).
    NotFound(String),
    /// Unexpected server error (500).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<RecommendError> for ApiError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::UnknownItem(_) => ApiError::NotFound(err.to_string()),
            RecommendError::Storage(ref e) => {
                tracing::error!(error = %e, "Storage failure");
                ApiError::Internal("Storage operation failed".into())
            }
            RecommendError::InvalidRating(_)
            | RecommendError::InvalidUser(_)
            | RecommendError::MalformedRow(_)
            | RecommendError::EmptyQuery => ApiError::BadRequest(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: RecommendError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status(RecommendError::InvalidRating("9".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(RecommendError::EmptyQuery), StatusCode::BAD_REQUEST);
        assert_eq!(status(RecommendError::UnknownItem(3)), StatusCode::NOT_FOUND);
        assert_eq!(
            status(RecommendError::Storage(std::io::Error::other("disk"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
