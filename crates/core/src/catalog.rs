//! Destination catalog.
//!
//! An [`Item`] is an immutable destination record with text attributes used by
//! the content scorer. The [`Catalog`] keeps items in load order, which is the
//! tie-break order for every ranking in this crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Catalog item identifier.
pub type ItemId = u32;

/// A tourist destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier.
    pub id: ItemId,
    /// Display name, assumed unique for lookups.
    pub name: String,
    /// Normalized (trimmed, lowercase) category, e.g. `"beach"`.
    pub category: String,
    /// Normalized (trimmed, lowercase) state, e.g. `"kedah"`.
    pub state: String,
    /// Optional free-text description, included in the content features.
    pub description: Option<String>,
    /// Aggregate rating from the source dataset.
    pub aggregate_rating: Option<f32>,
}

impl Item {
    /// Creates an item, normalizing category and state.
    pub fn new(id: ItemId, name: &str, category: &str, state: &str) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            category: normalize_tag(category),
            state: normalize_tag(state),
            description: None,
            aggregate_rating: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: &str) -> Self {
        let description = description.trim();
        self.description = (!description.is_empty()).then(|| description.to_string());
        self
    }

    /// Sets the aggregate rating.
    pub fn with_aggregate_rating(mut self, rating: f32) -> Self {
        self.aggregate_rating = rating.is_finite().then_some(rating);
        self
    }

    /// Text the content vectorizer is fitted on: category, state and description.
    pub fn feature_text(&self) -> String {
        let mut text = format!("{} {}", self.category, self.state);
        if let Some(ref description) = self.description {
            text.push(' ');
            text.push_str(description);
        }
        text
    }
}

/// A loosely-typed catalog row as supplied by an external loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRow {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "avg_rating")]
    pub aggregate_rating: Option<f32>,
}

/// Diagnostic statistics from building a catalog out of raw rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Rows turned into items.
    pub loaded: usize,
    /// Rows without a usable name.
    pub missing_name: usize,
    /// Rows whose id was already taken by an earlier row.
    pub duplicate_id: usize,
}

impl LoadStats {
    /// Total number of rows that were skipped.
    pub fn skipped(&self) -> usize {
        self.missing_name + self.duplicate_id
    }
}

/// Immutable, ordered set of items.
#[derive(Debug, Default)]
pub struct Catalog {
    items: Vec<Arc<Item>>,
    /// item id → position in `items`.
    positions: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Builds a catalog from typed items. Items with an already-seen id are dropped.
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let mut catalog = Self::default();
        for item in items {
            if !catalog.push(item) {
                tracing::warn!("Duplicate item id dropped from catalog");
            }
        }
        catalog
    }

    /// Builds a catalog from raw rows, skipping malformed ones.
    ///
    /// Rows without an id get `position + 1`. Category and state are trimmed and
    /// lowercased; a missing category or state becomes an empty string.
    pub fn from_rows(rows: impl IntoIterator<Item = CatalogRow>) -> (Self, LoadStats) {
        let mut catalog = Self::default();
        let mut stats = LoadStats::default();

        for (position, row) in rows.into_iter().enumerate() {
            let name = match row.name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name,
                _ => {
                    tracing::warn!(row = position, "Catalog row without a name, skipping");
                    stats.missing_name += 1;
                    continue;
                }
            };
            let id = row.id.unwrap_or(position as ItemId + 1);
            let mut item = Item::new(
                id,
                name,
                row.category.as_deref().unwrap_or_default(),
                row.state.as_deref().unwrap_or_default(),
            );
            if let Some(ref description) = row.description {
                item = item.with_description(description);
            }
            if let Some(rating) = row.aggregate_rating {
                item = item.with_aggregate_rating(rating);
            }

            if catalog.push(item) {
                stats.loaded += 1;
            } else {
                tracing::warn!(row = position, id, "Duplicate catalog id, skipping");
                stats.duplicate_id += 1;
            }
        }

        tracing::info!(
            loaded = stats.loaded,
            skipped = stats.skipped(),
            "Catalog built"
        );
        (catalog, stats)
    }

    fn push(&mut self, item: Item) -> bool {
        if self.positions.contains_key(&item.id) {
            return false;
        }
        self.positions.insert(item.id, self.items.len());
        self.items.push(Arc::new(item));
        true
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the catalog holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up an item by id.
    pub fn get(&self, id: ItemId) -> Option<&Arc<Item>> {
        self.positions.get(&id).map(|&pos| &self.items[pos])
    }

    /// Returns `true` if an item with this id exists.
    pub fn contains(&self, id: ItemId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Position of an item in load order.
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Item at a load-order position.
    pub fn at(&self, position: usize) -> Option<&Arc<Item>> {
        self.items.get(position)
    }

    /// First item whose name matches, ignoring case and surrounding whitespace.
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Item>> {
        let name = name.trim();
        self.items
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }

    /// Iterates items in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Item>> + '_ {
        self.items.iter()
    }

    /// Distinct non-empty categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        distinct(self.items.iter().map(|item| item.category.as_str()))
    }

    /// Distinct non-empty states in first-seen order.
    pub fn states(&self) -> Vec<String> {
        distinct(self.items.iter().map(|item| item.state.as_str()))
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .filter(|v| !v.is_empty() && seen.insert(*v))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: Option<&str>, category: &str, state: &str) -> CatalogRow {
        CatalogRow {
            name: name.map(str::to_string),
            category: Some(category.to_string()),
            state: Some(state.to_string()),
            ..CatalogRow::default()
        }
    }

    #[test]
    fn test_item_new_normalizes_tags() {
        let item = Item::new(1, "  Pantai Cenang ", " Beach ", "KEDAH");
        assert_eq!(item.name, "Pantai Cenang");
        assert_eq!(item.category, "beach");
        assert_eq!(item.state, "kedah");
    }

    #[test]
    fn test_feature_text_includes_description() {
        let item = Item::new(1, "A", "beach", "kedah").with_description("white sand");
        assert_eq!(item.feature_text(), "beach kedah white sand");
        let bare = Item::new(2, "B", "nature", "perak");
        assert_eq!(bare.feature_text(), "nature perak");
    }

    #[test]
    fn test_blank_description_is_dropped() {
        let item = Item::new(1, "A", "beach", "kedah").with_description("   ");
        assert!(item.description.is_none());
    }

    #[test]
    fn test_from_rows_assigns_positional_ids() {
        let (catalog, stats) = Catalog::from_rows(vec![
            row(Some("A"), "beach", "kedah"),
            row(Some("B"), "nature", "kedah"),
        ]);
        assert_eq!(stats.loaded, 2);
        assert_eq!(catalog.get(1).unwrap().name, "A");
        assert_eq!(catalog.get(2).unwrap().name, "B");
    }

    #[test]
    fn test_from_rows_skips_malformed() {
        let mut dup = row(Some("C"), "museum", "penang");
        dup.id = Some(1);
        let (catalog, stats) = Catalog::from_rows(vec![
            row(Some("A"), "beach", "kedah"),
            row(None, "beach", "kedah"),
            row(Some("   "), "beach", "kedah"),
            dup,
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(stats.missing_name, 2);
        assert_eq!(stats.duplicate_id, 1);
        assert_eq!(stats.skipped(), 3);
    }

    #[test]
    fn test_from_rows_missing_tags_become_empty() {
        let (catalog, _) = Catalog::from_rows(vec![CatalogRow {
            name: Some("Lonely".into()),
            ..CatalogRow::default()
        }]);
        let item = catalog.get(1).unwrap();
        assert_eq!(item.category, "");
        assert_eq!(item.state, "");
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let catalog = Catalog::new(vec![Item::new(7, "Penang Hill", "nature", "penang")]);
        assert_eq!(catalog.find_by_name("penang hill").unwrap().id, 7);
        assert!(catalog.find_by_name("Langkawi").is_none());
    }

    #[test]
    fn test_categories_and_states_distinct_in_order() {
        let catalog = Catalog::new(vec![
            Item::new(1, "A", "beach", "kedah"),
            Item::new(2, "B", "nature", "kedah"),
            Item::new(3, "C", "beach", "penang"),
            Item::new(4, "D", "", ""),
        ]);
        assert_eq!(catalog.categories(), vec!["beach", "nature"]);
        assert_eq!(catalog.states(), vec!["kedah", "penang"]);
    }

    #[test]
    fn test_new_drops_duplicate_ids() {
        let catalog = Catalog::new(vec![
            Item::new(1, "A", "beach", "kedah"),
            Item::new(1, "B", "nature", "kedah"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(1).unwrap().name, "A");
        assert_eq!(catalog.position(1), Some(0));
    }
}
