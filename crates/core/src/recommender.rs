//! Hybrid ranking facade.
//!
//! [`Recommender`] owns the catalog, the content scorer, the rating store and
//! the collaborative model, and routes each request to the scorers it names.
//! Scores from the two scorers are never blended; each requested scorer gets
//! its own ranked list in the response.
//!
//! The rating store and the collaborative model live behind a single
//! `RwLock`: a submission holds the write lock across append and rebuild, so
//! a reader never sees a model that lags behind the store.

use crate::catalog::{Catalog, Item, ItemId};
use crate::collaborative::CollaborativeModel;
use crate::config;
use crate::content::{ContentQuery, ContentScorer};
use crate::error::{RecommendError, Result};
use crate::ranking::{RankedItem, ScoredItem};
use crate::ratings::rating::validate_score;
use crate::ratings::{ImportStats, RatingStore, RawRating, Rating};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Tuning knobs for the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommenderConfig {
    /// List length when a request does not specify one.
    pub default_top_n: usize,
    /// Upper bound applied to every requested list length.
    pub max_top_n: usize,
    /// Neighbourhood cap for collaborative scoring. `None` uses every user.
    pub max_neighbors: Option<usize>,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            default_top_n: config::DEFAULT_TOP_N,
            max_top_n: config::MAX_TOP_N,
            max_neighbors: None,
        }
    }
}

/// A recommendation request: a content query, a user, or both.
#[derive(Debug, Clone, Default)]
pub struct RecommendRequest {
    pub content: Option<ContentQuery>,
    pub user_id: Option<String>,
    pub top_n: Option<usize>,
}

impl RecommendRequest {
    /// Request for content-based results only.
    pub fn content(query: ContentQuery) -> Self {
        Self {
            content: Some(query),
            ..Self::default()
        }
    }

    /// Request for collaborative results only.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }
}

/// One ranked list per scorer the request asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<RankedItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborative: Option<Vec<RankedItem>>,
}

/// Engine statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub items: usize,
    pub vocabulary: usize,
    pub ratings: usize,
    pub users: usize,
    pub rated_items: usize,
    pub durable: bool,
}

#[derive(Debug)]
struct RatingState {
    store: RatingStore,
    model: CollaborativeModel,
}

impl RatingState {
    fn rebuild(&mut self) {
        self.model = CollaborativeModel::build(self.store.all());
    }
}

/// Routes recommendation requests to the content and collaborative scorers.
#[derive(Debug)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    content: ContentScorer,
    state: RwLock<RatingState>,
    config: RecommenderConfig,
}

impl Recommender {
    /// Builds content vectors for the catalog and the collaborative model for the store.
    pub fn new(catalog: Catalog, store: RatingStore, config: RecommenderConfig) -> Self {
        let catalog = Arc::new(catalog);
        let content = ContentScorer::build(Arc::clone(&catalog));
        let model = CollaborativeModel::build(store.all());
        tracing::info!(
            items = catalog.len(),
            ratings = store.len(),
            users = model.user_count(),
            "Recommender ready"
        );
        Self {
            catalog,
            content,
            state: RwLock::new(RatingState { store, model }),
            config,
        }
    }

    fn clamp_top_n(&self, top_n: Option<usize>) -> usize {
        top_n
            .unwrap_or(self.config.default_top_n)
            .min(self.config.max_top_n)
    }

    /// Runs every scorer the request names.
    ///
    /// Fails with `EmptyQuery` when the request names neither a content query
    /// nor a user. An unknown user yields an empty collaborative list.
    pub fn recommend(&self, request: &RecommendRequest) -> Result<RecommendResponse> {
        if request.content.is_none() && request.user_id.is_none() {
            return Err(RecommendError::EmptyQuery);
        }
        let top_n = self.clamp_top_n(request.top_n);

        let content = request
            .content
            .as_ref()
            .map(|query| ranked(self.content.score(query, top_n)));

        let collaborative = match request.user_id {
            Some(ref user_id) => {
                let user_id = user_id.trim();
                if user_id.is_empty() {
                    return Err(RecommendError::InvalidUser("user id must not be blank".into()));
                }
                Some(self.recommend_for_user(user_id, Some(top_n)))
            }
            None => None,
        };

        tracing::debug!(
            top_n,
            content = content.as_ref().map(Vec::len),
            collaborative = collaborative.as_ref().map(Vec::len),
            "Recommendation served"
        );
        Ok(RecommendResponse {
            content,
            collaborative,
        })
    }

    /// Content-based ranking only.
    pub fn recommend_content(&self, query: &ContentQuery, top_n: Option<usize>) -> Vec<RankedItem> {
        ranked(self.content.score(query, self.clamp_top_n(top_n)))
    }

    /// Collaborative ranking only.
    ///
    /// A user with no ratings, including any id too long to have been stored,
    /// gets an empty list.
    pub fn recommend_for_user(&self, user_id: &str, top_n: Option<usize>) -> Vec<RankedItem> {
        let user_id = user_id.trim();
        let state = self.state.read();
        if !state.model.contains_user(user_id) {
            tracing::debug!("No ratings for user, collaborative list is empty");
            return Vec::new();
        }
        ranked(state.model.score(
            user_id,
            &self.catalog,
            self.clamp_top_n(top_n),
            self.config.max_neighbors,
        ))
    }

    /// Records a rating and rebuilds the collaborative model.
    ///
    /// Returns the new number of ratings. On error nothing changes.
    pub fn submit_rating(&self, user_id: &str, item_id: ItemId, score: i64) -> Result<usize> {
        validate_score(score)?;
        if !self.catalog.contains(item_id) {
            return Err(RecommendError::UnknownItem(item_id));
        }

        let mut state = self.state.write();
        state.store.submit(user_id, item_id, score)?;
        state.rebuild();
        tracing::debug!(item_id, score, ratings = state.store.len(), "Rating submitted");
        Ok(state.store.len())
    }

    /// Imports rating rows, resolving item names against the catalog.
    ///
    /// Rows naming an unknown item are skipped along with malformed ones. The
    /// model is rebuilt once at the end.
    pub fn import_ratings(&self, rows: &[RawRating]) -> Result<ImportStats> {
        let mut unknown = 0usize;
        let resolved: Vec<RawRating> = rows
            .iter()
            .filter_map(|row| match self.resolve_item(row) {
                Some(item_id) => Some(RawRating {
                    item_id: Some(item_id),
                    ..row.clone()
                }),
                None => {
                    unknown += 1;
                    None
                }
            })
            .collect();
        if unknown > 0 {
            tracing::warn!(rows = unknown, "Skipping ratings for items not in catalog");
        }

        let mut state = self.state.write();
        let mut stats = state.store.import(&resolved)?;
        stats.skipped += unknown;
        if stats.accepted > 0 {
            state.rebuild();
        }
        Ok(stats)
    }

    fn resolve_item(&self, row: &RawRating) -> Option<ItemId> {
        match (row.item_id, row.item_name.as_deref()) {
            (Some(id), _) => self.catalog.contains(id).then_some(id),
            (None, Some(name)) => self.catalog.find_by_name(name).map(|item| item.id),
            (None, None) => None,
        }
    }

    /// Recomputes the collaborative model from the full rating log.
    pub fn rebuild(&self) {
        self.state.write().rebuild();
    }

    /// Snapshots the rating store and truncates its WAL.
    pub fn compact(&self) -> Result<usize> {
        self.state.read().store.compact()
    }

    /// Items most similar in content to an existing item.
    pub fn similar_items(&self, item_id: ItemId, top_n: Option<usize>) -> Result<Vec<RankedItem>> {
        if !self.catalog.contains(item_id) {
            return Err(RecommendError::UnknownItem(item_id));
        }
        Ok(ranked(
            self.content.similar_items(item_id, self.clamp_top_n(top_n)),
        ))
    }

    pub fn item(&self, item_id: ItemId) -> Option<Arc<Item>> {
        self.catalog.get(item_id).cloned()
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Copy of the rating log.
    pub fn ratings(&self) -> Vec<Rating> {
        self.state.read().store.all().to_vec()
    }

    pub fn rating_count(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn stats(&self) -> Stats {
        let state = self.state.read();
        Stats {
            items: self.catalog.len(),
            vocabulary: self.content.vocabulary_size(),
            ratings: state.store.len(),
            users: state.model.user_count(),
            rated_items: state.model.item_count(),
            durable: state.store.is_durable(),
        }
    }
}

fn ranked(scored: Vec<ScoredItem>) -> Vec<RankedItem> {
    scored.iter().map(RankedItem::from).collect()
}
