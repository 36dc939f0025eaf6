//! Prometheus metrics recording and background collection.

use metrics::{counter, gauge, histogram};
use smarttour_core::Recommender;
use std::path::Path;
use std::time::Duration;

/// Records HTTP request metrics.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Counts a served recommendation by mode (`content`, `collaborative`, `hybrid`).
pub fn record_recommendation(mode: &'static str) {
    counter!("smarttour_recommendations_total", "mode" => mode).increment(1);
}

/// Counts an accepted rating submission.
pub fn record_rating_submitted() {
    counter!("smarttour_ratings_submitted_total").increment(1);
}

/// Updates engine-level gauges.
pub fn update_engine_metrics(recommender: &Recommender) {
    let stats = recommender.stats();
    gauge!("smarttour_catalog_items").set(stats.items as f64);
    gauge!("smarttour_ratings_total").set(stats.ratings as f64);
    gauge!("smarttour_users_total").set(stats.users as f64);
    gauge!("smarttour_rated_items_total").set(stats.rated_items as f64);
}

/// Updates the `smarttour_wal_size_bytes` gauge.
pub fn update_wal_metrics(wal_path: &Path) {
    if let Ok(meta) = std::fs::metadata(wal_path) {
        gauge!("smarttour_wal_size_bytes").set(meta.len() as f64);
    }
}
