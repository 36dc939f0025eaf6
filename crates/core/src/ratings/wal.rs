//! Synchronous write-ahead log for rating submissions.
//!
//! Every rating is appended to the WAL before it becomes visible in memory.
//! Each entry is framed as `[u32 length BE][u32 CRC32 BE][bincode payload]`
//! and durably flushed with `fsync`.
//!
//! Entries carry a monotonically increasing sequence number so replay can skip
//! entries already folded into a snapshot.

use crate::config::WAL_FILE_NAME;
use crate::ratings::rating::Rating;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// A single mutation entry in the write-ahead log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalEntry {
    /// One submitted rating.
    SubmitRating { seq: u64, rating: Rating },
    /// A bulk import, applied all-or-nothing on replay.
    ImportBatch { seq: u64, ratings: Vec<Rating> },
}

impl WalEntry {
    /// Sequence number of this entry.
    pub fn seq(&self) -> u64 {
        match self {
            WalEntry::SubmitRating { seq, .. } | WalEntry::ImportBatch { seq, .. } => *seq,
        }
    }
}

/// Diagnostic statistics from a WAL replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of entries successfully deserialized.
    pub success: usize,
    /// Number of entries skipped due to deserialization errors (CRC was valid).
    pub skipped: usize,
    /// Number of CRC mismatches encountered (replay stopped).
    pub crc_errors: usize,
    /// Whether replay was terminated by a truncated entry.
    pub truncated: bool,
}

/// Append-only write-ahead log with CRC32 integrity checks.
///
/// Thread-safe via `parking_lot::Mutex`. Each [`append`](SyncWriteAheadLog::append)
/// call serializes, writes, flushes, and fsyncs the entry before returning.
pub struct SyncWriteAheadLog {
    writer: Mutex<BufWriter<File>>,
    /// Write gate: freeze() takes exclusive, append() takes shared.
    write_gate: parking_lot::RwLock<()>,
    path: PathBuf,
}

impl std::fmt::Debug for SyncWriteAheadLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncWriteAheadLog")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SyncWriteAheadLog {
    /// Opens or creates `ratings.wal` inside `data_dir` in append mode.
    pub fn open(data_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(WAL_FILE_NAME);
        let file = open_append(&path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            write_gate: parking_lot::RwLock::new(()),
            path,
        })
    }

    /// Path of the WAL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an entry and fsyncs before returning.
    pub fn append(&self, entry: &WalEntry) -> io::Result<()> {
        let framed = serialize_and_frame(entry)?;

        let _gate = self.write_gate.read();
        let mut w = self.writer.lock();
        w.write_all(&framed)?;
        w.flush()?;
        w.get_mut().sync_all()?;
        Ok(())
    }

    /// Reads all entries sequentially, verifying CRC32 checksums.
    ///
    /// A truncated tail or a CRC mismatch stops replay; entries read before
    /// that point are returned.
    pub fn replay(&self) -> io::Result<(Vec<WalEntry>, ReplayStats)> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();
        let mut stats = ReplayStats::default();
        let mut header_buf = [0u8; 8];

        loop {
            match read_header(&mut reader, &mut header_buf) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    tracing::warn!("WAL truncated inside entry header, stopping replay");
                    stats.truncated = true;
                    break;
                }
                Err(e) => return Err(e),
            }
            let len =
                u32::from_be_bytes([header_buf[0], header_buf[1], header_buf[2], header_buf[3]])
                    as usize;
            let stored_crc =
                u32::from_be_bytes([header_buf[4], header_buf[5], header_buf[6], header_buf[7]]);
            let mut data = vec![0u8; len];
            match reader.read_exact(&mut data) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    tracing::warn!("WAL truncated mid-entry, stopping replay");
                    stats.truncated = true;
                    break;
                }
                Err(e) => return Err(e),
            }
            if crc32fast::hash(&data) != stored_crc {
                tracing::warn!(entry = entries.len(), "WAL entry CRC mismatch, stopping replay");
                stats.crc_errors += 1;
                break;
            }
            match bincode::deserialize::<WalEntry>(&data) {
                Ok(entry) => {
                    entries.push(entry);
                    stats.success += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "WAL entry deserialization failed, skipping");
                    stats.skipped += 1;
                }
            }
        }

        Ok((entries, stats))
    }

    /// Acquires an exclusive write gate, blocking all appends.
    ///
    /// Hold the returned guard while performing snapshot + truncate.
    pub fn freeze(&self) -> parking_lot::RwLockWriteGuard<'_, ()> {
        self.write_gate.write()
    }

    /// Truncates the WAL file, fsyncs, and reopens it in append mode.
    pub fn truncate(&self) -> io::Result<()> {
        let mut writer = self.writer.lock();
        let truncated = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        truncated.sync_all()?;
        *writer = BufWriter::new(open_append(&self.path)?);
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    opts.open(path)
}

/// Fills `buf` with the next header. `Ok(false)` on a clean end of file.
fn read_header(reader: &mut impl Read, buf: &mut [u8; 8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Serializes an entry into its on-disk frame:
/// `[u32 len BE][u32 crc32 BE][bincode payload]`.
fn serialize_and_frame(entry: &WalEntry) -> io::Result<Vec<u8>> {
    let bytes = bincode::serialize(entry).map_err(|e| io::Error::other(e.to_string()))?;
    let len = bytes.len() as u32;
    let crc = crc32fast::hash(&bytes);

    let mut framed = Vec::with_capacity(8 + bytes.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(&crc.to_be_bytes());
    framed.extend_from_slice(&bytes);
    Ok(framed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir() -> PathBuf {
        let id = uuid::Uuid::new_v4();
        std::env::temp_dir().join(format!("smarttour_wal_{id}"))
    }

    fn cleanup(dir: &Path) {
        let _ = std::fs::remove_dir_all(dir);
    }

    fn submit(seq: u64, user: &str, item: u32, score: u8) -> WalEntry {
        WalEntry::SubmitRating {
            seq,
            rating: Rating {
                user_id: user.into(),
                item_id: item,
                score,
            },
        }
    }

    #[test]
    fn test_append_and_replay() {
        let dir = tmp_dir();
        {
            let wal = SyncWriteAheadLog::open(&dir).unwrap();
            wal.append(&submit(1, "u1", 1, 5)).unwrap();
            wal.append(&WalEntry::ImportBatch {
                seq: 2,
                ratings: vec![Rating {
                    user_id: "u2".into(),
                    item_id: 1,
                    score: 4,
                }],
            })
            .unwrap();

            let (entries, stats) = wal.replay().unwrap();
            assert_eq!(stats.success, 2);
            assert_eq!(stats.crc_errors, 0);
            assert!(!stats.truncated);
            assert_eq!(entries[0], submit(1, "u1", 1, 5));
            assert_eq!(entries[1].seq(), 2);
        }
        cleanup(&dir);
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tmp_dir();
        {
            let wal = SyncWriteAheadLog::open(&dir).unwrap();
            wal.append(&submit(1, "u1", 2, 3)).unwrap();
        }
        {
            let wal = SyncWriteAheadLog::open(&dir).unwrap();
            wal.append(&submit(2, "u1", 3, 4)).unwrap();
            let (entries, _) = wal.replay().unwrap();
            assert_eq!(entries.len(), 2);
        }
        cleanup(&dir);
    }

    #[test]
    fn test_truncate_clears_wal() {
        let dir = tmp_dir();
        {
            let wal = SyncWriteAheadLog::open(&dir).unwrap();
            wal.append(&submit(1, "u1", 1, 1)).unwrap();
            let _gate = wal.freeze();
            wal.truncate().unwrap();
            let (entries, _) = wal.replay().unwrap();
            assert!(entries.is_empty(), "WAL should be empty after truncate");
        }
        cleanup(&dir);
    }

    #[test]
    fn test_crc_corruption_stops_replay() {
        let dir = tmp_dir();
        let path = dir.join(WAL_FILE_NAME);
        {
            let wal = SyncWriteAheadLog::open(&dir).unwrap();
            wal.append(&submit(1, "u1", 1, 5)).unwrap();
            wal.append(&submit(2, "u2", 1, 4)).unwrap();
        }
        // Flip a byte in the second entry's payload.
        let mut data = std::fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        std::fs::write(&path, &data).unwrap();
        {
            let wal = SyncWriteAheadLog::open(&dir).unwrap();
            let (entries, stats) = wal.replay().unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(stats.crc_errors, 1);
        }
        cleanup(&dir);
    }

    #[test]
    fn test_truncated_tail_tolerated() {
        let dir = tmp_dir();
        let path = dir.join(WAL_FILE_NAME);
        {
            let wal = SyncWriteAheadLog::open(&dir).unwrap();
            wal.append(&submit(1, "u1", 1, 5)).unwrap();
            wal.append(&submit(2, "u2", 1, 4)).unwrap();
        }
        let data = std::fs::read(&path).unwrap();
        std::fs::write(&path, &data[..data.len() - 3]).unwrap();
        {
            let wal = SyncWriteAheadLog::open(&dir).unwrap();
            let (entries, stats) = wal.replay().unwrap();
            assert_eq!(entries.len(), 1);
            assert!(stats.truncated);
        }
        cleanup(&dir);
    }

    #[test]
    fn test_serialize_and_frame_format() {
        let framed = serialize_and_frame(&submit(7, "u", 1, 2)).unwrap();
        let len = u32::from_be_bytes([framed[0], framed[1], framed[2], framed[3]]) as usize;
        let stored_crc = u32::from_be_bytes([framed[4], framed[5], framed[6], framed[7]]);
        let payload = &framed[8..];
        assert_eq!(payload.len(), len);
        assert_eq!(crc32fast::hash(payload), stored_crc);
    }
}
