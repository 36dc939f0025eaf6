//! Rating snapshots on disk.
//!
//! A snapshot is the full rating log serialized with bincode, followed by a
//! footer `[magic "SRS1"][u32 CRC32 BE]`. Writes go to a temp file that is
//! renamed into place, so a crash never leaves a half-written snapshot.

use crate::config::SNAPSHOT_FILE_NAME;
use crate::ratings::rating::Rating;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

const SNAPSHOT_MAGIC: &[u8; 4] = b"SRS1";

/// Persisted state of the rating store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Sequence number of the last WAL entry folded into `ratings`.
    pub last_seq: u64,
    pub ratings: Vec<Rating>,
}

/// Writes `ratings.snap` into `dir` atomically. Returns the payload size in bytes.
pub fn save(dir: &Path, snapshot: &Snapshot) -> io::Result<usize> {
    let bytes = bincode::serialize(snapshot).map_err(|e| io::Error::other(e.to_string()))?;
    let crc = crc32fast::hash(&bytes);

    fs::create_dir_all(dir)?;
    let path = dir.join(SNAPSHOT_FILE_NAME);
    let tmp_path = dir.join(format!("{SNAPSHOT_FILE_NAME}.tmp"));

    let mut output = Vec::with_capacity(bytes.len() + 8);
    output.extend_from_slice(&bytes);
    output.extend_from_slice(SNAPSHOT_MAGIC);
    output.extend_from_slice(&crc.to_be_bytes());

    fs::write(&tmp_path, &output)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }
    fs::File::open(&tmp_path)?.sync_all()?;
    fs::rename(&tmp_path, &path)?;

    tracing::info!(
        ratings = snapshot.ratings.len(),
        last_seq = snapshot.last_seq,
        bytes = bytes.len(),
        crc,
        "Saved ratings snapshot"
    );
    Ok(bytes.len())
}

/// Loads `ratings.snap` from `dir`. `Ok(None)` if there is no snapshot yet.
///
/// A missing footer or a CRC mismatch is reported as `InvalidData`.
pub fn load(dir: &Path) -> io::Result<Option<Snapshot>> {
    let path = dir.join(SNAPSHOT_FILE_NAME);
    let raw = match fs::read(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    if raw.len() < 8 || &raw[raw.len() - 8..raw.len() - 4] != SNAPSHOT_MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("snapshot {path:?} has no checksum footer"),
        ));
    }
    let payload = &raw[..raw.len() - 8];
    let stored_crc = u32::from_be_bytes([
        raw[raw.len() - 4],
        raw[raw.len() - 3],
        raw[raw.len() - 2],
        raw[raw.len() - 1],
    ]);
    let computed_crc = crc32fast::hash(payload);
    if computed_crc != stored_crc {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "snapshot CRC32 mismatch: expected {stored_crc:#010x}, got {computed_crc:#010x} in {path:?}"
            ),
        ));
    }

    let snapshot: Snapshot = bincode::deserialize(payload)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    tracing::info!(
        ratings = snapshot.ratings.len(),
        last_seq = snapshot.last_seq,
        "Loaded ratings snapshot"
    );
    Ok(Some(snapshot))
}
