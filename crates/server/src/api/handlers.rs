//! HTTP request handlers and shared application state.

use crate::api::errors::ApiError;
use crate::api::metrics;
use crate::api::models::*;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use smarttour_core::catalog::ItemId;
use smarttour_core::{RankedItem, RecommendResponse, Recommender};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state passed to every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub prometheus_handle: PrometheusHandle,
    pub start_time: Instant,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.recommender.stats();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        items: stats.items,
        ratings: stats.ratings,
        users: stats.users,
        durable: stats.durable,
    })
}

/// `POST /recommend`
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendBody>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Json(body) = payload.map_err(reject_body)?;
    let mode = body.mode();
    let response = state.recommender.recommend(&body.into_request())?;
    metrics::record_recommendation(mode);
    Ok(Json(response))
}

/// `POST /ratings`
///
/// Append and rebuild run on the blocking pool.
pub async fn submit_rating(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRatingRequest>, JsonRejection>,
) -> Result<Json<CountResponse>, ApiError> {
    let Json(req) = payload.map_err(reject_body)?;
    let score = i64::from(req.score.parse()?);
    let item_id = req.item_id;
    let recommender = state.recommender.clone();
    let count = tokio::task::spawn_blocking(move || {
        recommender.submit_rating(&req.user_id, item_id, score)
    })
    .await
    .map_err(join_failed)??;
    metrics::record_rating_submitted();
    tracing::info!(item_id, score, count, "Rating accepted");
    Ok(Json(CountResponse { count }))
}

/// `GET /ratings/count`
pub async fn rating_count(State(state): State<AppState>) -> Json<CountResponse> {
    Json(CountResponse {
        count: state.recommender.rating_count(),
    })
}

/// `GET /catalog/categories`
pub async fn categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.recommender.catalog().categories())
}

/// `GET /catalog/states`
pub async fn states(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.recommender.catalog().states())
}

/// `GET /items/:id`
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state
        .recommender
        .item(id)
        .ok_or_else(|| ApiError::NotFound(format!("item {id} not found in catalog")))?;
    Ok(Json(ItemResponse::from(item.as_ref())))
}

/// `GET /items/:id/similar`
pub async fn similar_items(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<Vec<RankedItem>>, ApiError> {
    let items = state.recommender.similar_items(id, query.top_n)?;
    Ok(Json(items))
}

/// `POST /admin/compact`
pub async fn compact(State(state): State<AppState>) -> Result<Json<CompactResponse>, ApiError> {
    let recommender = state.recommender.clone();
    let ratings = tokio::task::spawn_blocking(move || recommender.compact())
        .await
        .map_err(join_failed)??;
    Ok(Json(CompactResponse {
        message: "Snapshot written, WAL truncated".into(),
        ratings,
    }))
}

/// `GET /metrics`
pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    metrics::update_engine_metrics(&state.recommender);
    state.prometheus_handle.render()
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

fn join_failed(err: tokio::task::JoinError) -> ApiError {
    tracing::error!(error = %err, "Blocking task failed");
    ApiError::Internal("Request processing failed".into())
}
