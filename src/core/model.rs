// Unilog - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
//
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// An absolute point in time with millisecond precision and the fixed UTC
/// offset it was written with. Ordering compares instants, so records from
/// sources in different zones interleave correctly.
pub type Timestamp = DateTime<FixedOffset>;

// =============================================================================
// Log Record
// =============================================================================

/// One logical log entry: the line that carried a timestamp plus every
/// following line that did not.
///
/// `lines` is never empty. Records are built by `core::segment` and handed
/// off by value; nothing keeps a reference after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// Identifier of the originating source (path relative to the scan root).
    pub source_id: Arc<str>,

    /// Timestamp of the first line.
    #[serde(serialize_with = "crate::core::timestamp::serialize_timestamp")]
    pub timestamp: Timestamp,

    /// 1-based line number of the first line within its source.
    pub line_number: u64,

    /// Raw lines in original order, whitespace-trimmed.
    pub lines: Vec<String>,
}

impl LogRecord {
    /// Open a record with its first (timestamped) line.
    pub fn new(source_id: Arc<str>, timestamp: Timestamp, line_number: u64, line: String) -> Self {
        Self {
            source_id,
            timestamp,
            line_number,
            lines: vec![line],
        }
    }

    /// Append a continuation line.
    pub fn push_line(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// All lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

// =============================================================================
// Source File (output of discovery)
// =============================================================================

/// A log file selected for merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path to the file.
    pub path: PathBuf,

    /// Display identifier carried into every record from this file.
    pub source_id: String,

    /// File size in bytes.
    pub size: u64,

    /// Whether this file exceeds the large file threshold (read via mmap).
    pub is_large: bool,
}

// =============================================================================
// Run Summary
// =============================================================================

/// Summary statistics for a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Sources handed to the pipeline.
    pub sources_attempted: usize,

    /// Sources that were read and segmented to completion.
    pub sources_succeeded: usize,

    /// Sources recorded as failures.
    pub sources_failed: usize,

    /// Records accepted by the filter, summed over all sources.
    pub records_accepted: usize,

    /// Per-source breakdown, in stream order.
    pub source_summaries: Vec<SourceSummary>,

    /// Wall-clock time spent reading and segmenting.
    pub duration: std::time::Duration,
}

/// Per-source statistics.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub source_id: String,

    /// Records that survived the filter.
    pub records: usize,

    /// Earliest accepted timestamp.
    pub earliest: Option<Timestamp>,

    /// Latest accepted timestamp.
    pub latest: Option<Timestamp>,
}
