//! Append-only rating store.
//!
//! The store is a log of validated ratings. In durable mode every append is
//! written to the WAL before it becomes visible; [`RatingStore::compact`]
//! folds the log into a snapshot and truncates the WAL.
//!
//! The store itself does no locking. The recommender facade owns it behind a
//! `RwLock` together with the collaborative model derived from it.

use crate::catalog::ItemId;
use crate::config;
use crate::error::Result;
use crate::ratings::rating::{RawRating, Rating};
use crate::ratings::snapshot::{self, Snapshot};
use crate::ratings::wal::{ReplayStats, SyncWriteAheadLog, WalEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of a bulk import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub accepted: usize,
    pub skipped: usize,
}

#[derive(Debug)]
struct Durability {
    dir: PathBuf,
    wal: SyncWriteAheadLog,
}

/// Log of `(user, item, score)` observations.
#[derive(Debug)]
pub struct RatingStore {
    ratings: Vec<Rating>,
    durability: Option<Durability>,
    /// Sequence number of the last WAL entry applied.
    last_seq: u64,
}

impl RatingStore {
    /// A store without persistence.
    pub fn in_memory() -> Self {
        Self {
            ratings: Vec::new(),
            durability: None,
            last_seq: 0,
        }
    }

    /// Opens a durable store in `data_dir`, restoring the snapshot and replaying the WAL.
    ///
    /// A damaged WAL tail is dropped by compacting right away, so later appends
    /// survive the next restart.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<(Self, ReplayStats)> {
        let dir = data_dir.as_ref().to_path_buf();
        let wal = SyncWriteAheadLog::open(&dir)?;
        let Snapshot { last_seq, ratings } = snapshot::load(&dir)?.unwrap_or_default();
        let snapshot_seq = last_seq;

        let mut store = Self {
            ratings,
            durability: None,
            last_seq,
        };
        let (entries, stats) = wal.replay()?;
        let mut replayed = 0usize;
        for entry in entries {
            if entry.seq() <= snapshot_seq {
                continue;
            }
            store.last_seq = store.last_seq.max(entry.seq());
            match entry {
                WalEntry::SubmitRating { rating, .. } => store.ratings.push(rating),
                WalEntry::ImportBatch { ratings, .. } => store.ratings.extend(ratings),
            }
            replayed += 1;
        }
        store.durability = Some(Durability { dir, wal });

        if stats.truncated || stats.crc_errors > 0 {
            // Nothing may follow a damaged frame: replay stops there.
            if let Some(ref durability) = store.durability {
                tracing::warn!(
                    path = %durability.wal.path().display(),
                    recovered = store.ratings.len(),
                    "Discarding damaged WAL tail"
                );
            }
            store.compact()?;
        }

        tracing::info!(
            ratings = store.ratings.len(),
            replayed,
            crc_errors = stats.crc_errors,
            truncated = stats.truncated,
            "Rating store opened"
        );
        Ok((store, stats))
    }

    /// Appends one rating after validating it.
    ///
    /// On any error the store is unchanged.
    pub fn submit(&mut self, user_id: &str, item_id: ItemId, score: i64) -> Result<&Rating> {
        let rating = Rating::new(user_id, item_id, score)?;
        let seq = self.last_seq + 1;
        if let Some(ref durability) = self.durability {
            durability.wal.append(&WalEntry::SubmitRating {
                seq,
                rating: rating.clone(),
            })?;
        }
        self.last_seq = seq;
        self.ratings.push(rating);
        Ok(&self.ratings[self.ratings.len() - 1])
    }

    /// Appends loosely-typed rows, skipping malformed ones.
    ///
    /// Accepted rows are logged as a single WAL entry. Rows beyond
    /// `MAX_IMPORT_ROWS` are counted as skipped.
    pub fn import<'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a RawRating>,
    ) -> Result<ImportStats> {
        let mut stats = ImportStats::default();
        let mut accepted = Vec::new();
        for (position, row) in rows.into_iter().enumerate() {
            if position >= config::MAX_IMPORT_ROWS {
                stats.skipped += 1;
                continue;
            }
            match Rating::try_from(row) {
                Ok(rating) => accepted.push(rating),
                Err(e) => {
                    tracing::warn!(row = position, error = %e, "Skipping malformed rating row");
                    stats.skipped += 1;
                }
            }
        }
        if accepted.is_empty() {
            return Ok(stats);
        }

        let seq = self.last_seq + 1;
        if let Some(ref durability) = self.durability {
            durability.wal.append(&WalEntry::ImportBatch {
                seq,
                ratings: accepted.clone(),
            })?;
        }
        self.last_seq = seq;
        stats.accepted = accepted.len();
        self.ratings.extend(accepted);
        tracing::info!(
            accepted = stats.accepted,
            skipped = stats.skipped,
            "Ratings imported"
        );
        Ok(stats)
    }

    /// Writes a snapshot and truncates the WAL. Returns the number of ratings persisted.
    ///
    /// No-op for in-memory stores.
    pub fn compact(&self) -> Result<usize> {
        let Some(ref durability) = self.durability else {
            return Ok(0);
        };
        let _gate = durability.wal.freeze();
        let snapshot = Snapshot {
            last_seq: self.last_seq,
            ratings: self.ratings.clone(),
        };
        snapshot::save(&durability.dir, &snapshot)?;
        durability.wal.truncate()?;
        tracing::info!(ratings = self.ratings.len(), "Rating store compacted");
        Ok(self.ratings.len())
    }

    /// Every rating in append order, duplicates included.
    pub fn all(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Ratings submitted by one user, in append order.
    pub fn for_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Rating> + 'a {
        self.ratings.iter().filter(move |r| r.user_id == user_id)
    }

    /// Data directory of a durable store.
    pub fn data_dir(&self) -> Option<&Path> {
        self.durability.as_ref().map(|d| d.dir.as_path())
    }

    /// Returns `true` if appends are persisted.
    pub fn is_durable(&self) -> bool {
        self.durability.is_some()
    }
}

impl Default for RatingStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
