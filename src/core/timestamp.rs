// Unilog - core/timestamp.rs
//
// Record-boundary timestamp extraction and user time-bound parsing.
// Core layer: pure functions, no I/O.

use crate::core::model::Timestamp;
use crate::util::constants::{TIMESTAMP_FORMAT, TIMESTAMP_PATTERN};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use regex::Regex;
use serde::Serializer;
use std::sync::OnceLock;

/// A substring matched `TIMESTAMP_PATTERN` but the chrono parser refused it.
///
/// The caller adds the source/line context and turns it into a
/// `ParseError::TimestampInconsistent`.
#[derive(Debug)]
pub struct UnparsableTimestamp {
    pub raw: String,
    pub source: chrono::ParseError,
}

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The pattern is a compile-time constant covered by the tests below.
    RE.get_or_init(|| Regex::new(TIMESTAMP_PATTERN).expect("TIMESTAMP_PATTERN is a valid regex"))
}

/// Find the first record timestamp in `line`.
///
/// `Ok(None)` means the line carries no timestamp and is a continuation
/// line. Only the leftmost match is considered.
pub fn extract_timestamp(line: &str) -> Result<Option<Timestamp>, UnparsableTimestamp> {
    let Some(found) = timestamp_regex().find(line) else {
        return Ok(None);
    };
    parse_log_timestamp(found.as_str())
        .map(Some)
        .map_err(|source| UnparsableTimestamp {
            raw: found.as_str().to_string(),
            source,
        })
}

/// Parse a string in the record timestamp shape, e.g.
/// `2021-01-01T00:00:00.000+0000`.
pub fn parse_log_timestamp(raw: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
}

/// Millisecond RFC 3339, keeping the record's own offset. Every output
/// format prints timestamps this way.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// serde `serialize_with` hook writing [`format_timestamp`].
pub fn serialize_timestamp<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

/// Parse a user-supplied time bound (`--start-time`, `[filter] end_time`).
///
/// Accepted, in order:
///   1. RFC 3339: `2021-12-01T00:00:00+00:00`
///   2. The log shape: `2021-12-01T00:00:00.000+0000`
///   3. Naive date-time, read as UTC: `2021-12-01T00:00:00`, `2021-12-01 00:00:00.5`
///   4. Bare date, midnight UTC: `2021-12-01`
///
/// On failure the error from the RFC 3339 attempt is returned, since that is
/// the format the error messages suggest.
pub fn parse_time_bound(text: &str) -> Result<Timestamp, chrono::ParseError> {
    let text = text.trim();
    let rfc_err = match DateTime::parse_from_rfc3339(text) {
        Ok(ts) => return Ok(ts),
        Err(e) => e,
    };
    if let Ok(ts) = parse_log_timestamp(text) {
        return Ok(ts);
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(ndt.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }
    Err(rfc_err)
}

// =============================================================================
// Tests
// =============================================================================
