//! JSON loaders for the catalog and rating import files.
//!
//! Both files are JSON arrays of objects. Entries that do not deserialize
//! into the row type are skipped and counted; only an unreadable file or a
//! document that is not an array is an error.

use serde::de::DeserializeOwned;
use smarttour_core::{Catalog, CatalogRow, LoadStats, RawRating};
use std::fs;
use std::io;
use std::path::Path;

/// Rows read from a JSON file.
#[derive(Debug)]
pub struct Rows<T> {
    pub rows: Vec<T>,
    /// Array entries that did not match the row shape.
    pub malformed: usize,
}

/// Reads a JSON array, keeping every entry that deserializes as `T`.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> io::Result<Rows<T>> {
    let text = fs::read_to_string(path)?;
    parse_rows(&text).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {e}", path.display()),
        )
    })
}

/// Parses a JSON array, keeping every entry that deserializes as `T`.
pub fn parse_rows<T: DeserializeOwned>(text: &str) -> serde_json::Result<Rows<T>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
    let mut rows = Vec::with_capacity(values.len());
    let mut malformed = 0;
    for (position, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!(row = position, error = %e, "Skipping malformed JSON row");
                malformed += 1;
            }
        }
    }
    Ok(Rows { rows, malformed })
}

/// Loads the catalog file and builds the catalog.
pub fn load_catalog(path: &Path) -> io::Result<(Catalog, LoadStats, usize)> {
    let Rows { rows, malformed } = read_rows::<CatalogRow>(path)?;
    let (catalog, stats) = Catalog::from_rows(rows);
    tracing::info!(
        path = %path.display(),
        items = catalog.len(),
        skipped = stats.skipped() + malformed,
        "Catalog loaded"
    );
    Ok((catalog, stats, malformed))
}

/// Reads a ratings import file.
pub fn load_ratings(path: &Path) -> io::Result<Rows<RawRating>> {
    read_rows::<RawRating>(path)
}
