//! smarttour-server: HTTP front end for the SmartTour recommendation engine.
//!
//! Provides the REST API and the JSON loaders for catalog and rating files.
//! Scoring and rating storage live in `smarttour-core`.

/// REST API layer: Axum router, HTTP handlers, models, metrics.
pub mod api;
/// JSON catalog and ratings loaders.
pub mod loader;
