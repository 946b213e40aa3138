// Unilog - core/segment.rs
//
// Turns one source's lines into filtered `LogRecord`s.
//
// A line carrying a record timestamp opens a new record; lines without one
// are continuations of the open record. Lines before the first timestamp
// have no record to join and are dropped. Each record is checked against
// the filter when it closes, and only accepted records are yielded.
//
// Core layer: accepts any iterator of lines, never touches the filesystem.

use crate::core::filter::FilterConfig;
use crate::core::model::LogRecord;
use crate::core::timestamp::{extract_timestamp, UnparsableTimestamp};
use crate::util::error::ParseError;
use std::iter::FusedIterator;
use std::sync::Arc;

/// Lazy, single-pass record stream over one source.
///
/// Yields `Err` at most once: a parse inconsistency ends the stream, and the
/// record that was open at that point is discarded.
pub struct RecordSegmenter<'f, I> {
    lines: I,
    source_id: Arc<str>,
    filter: &'f FilterConfig,
    open: Option<LogRecord>,
    line_number: u64,
    orphan_lines: u64,
    finished: bool,
}

/// Segment `lines` from `source_id` into records accepted by `filter`.
pub fn segment<I, S>(
    lines: I,
    source_id: impl Into<Arc<str>>,
    filter: &FilterConfig,
) -> RecordSegmenter<'_, I::IntoIter>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    RecordSegmenter {
        lines: lines.into_iter(),
        source_id: source_id.into(),
        filter,
        open: None,
        line_number: 0,
        orphan_lines: 0,
        finished: false,
    }
}

impl<I> RecordSegmenter<'_, I> {
    /// Lines seen so far that preceded the first timestamp.
    pub fn orphan_lines(&self) -> u64 {
        self.orphan_lines
    }

    /// Lines consumed so far.
    pub fn lines_read(&self) -> u64 {
        self.line_number
    }

    fn close_open(&mut self) -> Option<LogRecord> {
        self.open.take().filter(|r| self.filter.accepts(r))
    }
}

impl<I, S> Iterator for RecordSegmenter<'_, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Result<LogRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while let Some(raw) = self.lines.next() {
            self.line_number += 1;
            let line = raw.as_ref().trim();

            match extract_timestamp(line) {
                Ok(Some(timestamp)) => {
                    let closed = self.close_open();
                    self.open = Some(LogRecord::new(
                        Arc::clone(&self.source_id),
                        timestamp,
                        self.line_number,
                        line.to_string(),
                    ));
                    if let Some(record) = closed {
                        return Some(Ok(record));
                    }
                }
                Ok(None) => match self.open.as_mut() {
                    Some(record) => record.push_line(line.to_string()),
                    None => {
                        self.orphan_lines += 1;
                        tracing::trace!(
                            source = %self.source_id,
                            line = self.line_number,
                            "Dropping line before first timestamp"
                        );
                    }
                },
                Err(UnparsableTimestamp { raw, source }) => {
                    self.finished = true;
                    self.open = None;
                    return Some(Err(ParseError::TimestampInconsistent {
                        source_id: self.source_id.to_string(),
                        line_number: self.line_number,
                        raw,
                        source,
                    }));
                }
            }
        }

        self.finished = true;
        if self.orphan_lines > 0 {
            tracing::debug!(
                source = %self.source_id,
                dropped = self.orphan_lines,
                "Lines before the first timestamp were dropped"
            );
        }
        self.close_open().map(Ok)
    }
}

impl<I, S> FusedIterator for RecordSegmenter<'_, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
}

// =============================================================================
// Tests
// =============================================================================
