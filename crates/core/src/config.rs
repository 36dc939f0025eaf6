//! Global configuration constants for smarttour.
//!
//! Rating bounds, ranking limits, storage file names and server defaults are
//! defined here. These are compile-time constants; runtime configuration is
//! handled via CLI arguments and environment variables in the server binary.

/// Lowest accepted rating score.
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating score.
pub const MAX_RATING: u8 = 5;

/// Number of results returned when a request does not specify `top_n`.
pub const DEFAULT_TOP_N: usize = 5;

/// Maximum number of results (`top_n`) per recommendation request.
pub const MAX_TOP_N: usize = 1_000;

/// Maximum length of a user id in bytes.
pub const MAX_USER_ID_LEN: usize = 128;

/// Maximum number of rows accepted by a single ratings import.
pub const MAX_IMPORT_ROWS: usize = 1_000_000;

/// File name of the ratings write-ahead log inside the data directory.
pub const WAL_FILE_NAME: &str = "ratings.wal";

/// File name of the ratings snapshot inside the data directory.
pub const SNAPSHOT_FILE_NAME: &str = "ratings.snap";

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 3030;

/// Default directory for WAL and snapshot files.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default interval (in seconds) between automatic snapshots. 0 = disabled.
pub const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 300;

/// Per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum HTTP request body size in bytes (1 MB).
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Maximum number of concurrent in-flight requests.
pub const MAX_CONCURRENT_REQUESTS: usize = 256;
