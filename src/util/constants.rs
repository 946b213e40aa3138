// Unilog - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "Unilog";

/// Application identifier used for the config directory.
pub const APP_ID: &str = "unilog";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Record boundaries
// =============================================================================

/// The one timestamp shape that opens a new record, e.g.
/// `2021-01-01T00:00:00.000+0000`. Searched anywhere in the line; the first
/// hit wins. ASCII digits only: chrono rejects any other digit, so a
/// look-alike in another script must not open a record.
pub const TIMESTAMP_PATTERN: &str =
    r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3}[+-][0-9]{4}";

/// chrono format string agreeing with `TIMESTAMP_PATTERN`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

// =============================================================================
// Filter patterns
// =============================================================================

/// Prefix marking a user-supplied pattern as case-insensitive (`"-i error"`).
pub const CASE_INSENSITIVE_PREFIX: &str = "-i ";

/// Maximum regex pattern length accepted from configuration.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Discovery limits
// =============================================================================

/// Default recursion depth. 1 means the directory's own files only.
pub const DEFAULT_MAX_DEPTH: usize = 1;

/// Hard upper bound on max depth (prevents runaway traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 50;

/// Default include glob patterns for log file discovery.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.log"];

/// Default exclude glob patterns for log file discovery.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["*.gz", "*.zip", ".git"];

// =============================================================================
// Reading and parallelism
// =============================================================================

/// File size threshold in bytes above which files are memory-mapped.
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 64 * 1024 * 1024; // 64 MB

/// Default number of worker threads for parallel segmentation.
/// 0 means auto-detect (use available CPU cores).
pub const DEFAULT_WORKER_THREADS: usize = 0;

/// Hard upper bound on configured worker threads.
pub const MAX_WORKER_THREADS: usize = 256;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
