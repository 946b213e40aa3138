// Unilog - core/merge.rs
//
// Streaming k-way merge of per-source record streams into one stream
// ordered by timestamp.
//
// Each input must already be non-decreasing in time; that holds for
// append-only logs and is not checked. At most one record per input is held
// at any moment. Equal timestamps from different inputs come out in input
// order, and records from the same input never overtake each other.

use crate::core::model::{LogRecord, Timestamp};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::iter::FusedIterator;

/// Head-of-stream record waiting in the heap.
struct Pending {
    timestamp: Timestamp,
    stream: usize,
    record: LogRecord,
}

// BinaryHeap is a max-heap; order reversed so the earliest (then the
// lowest stream index) is on top.
impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.stream.cmp(&self.stream))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

/// Lazy merged stream. Built by [`merge`].
pub struct MergedRecords<I> {
    streams: Vec<I>,
    heap: BinaryHeap<Pending>,
}

/// Merge `streams` by timestamp. Ties go to the stream listed first.
pub fn merge<S>(streams: impl IntoIterator<Item = S>) -> MergedRecords<S::IntoIter>
where
    S: IntoIterator<Item = LogRecord>,
{
    let mut streams: Vec<S::IntoIter> = streams.into_iter().map(IntoIterator::into_iter).collect();
    let mut heap = BinaryHeap::with_capacity(streams.len());
    for (index, stream) in streams.iter_mut().enumerate() {
        if let Some(record) = stream.next() {
            heap.push(Pending {
                timestamp: record.timestamp,
                stream: index,
                record,
            });
        }
    }
    tracing::trace!(streams = streams.len(), primed = heap.len(), "Merge primed");
    MergedRecords { streams, heap }
}

impl<I> MergedRecords<I> {
    /// Records currently buffered; never more than one per input stream.
    pub fn pending(&self) -> usize {
        self.heap.len()
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}

impl<I> Iterator for MergedRecords<I>
where
    I: Iterator<Item = LogRecord>,
{
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        let Pending { stream, record, .. } = self.heap.pop()?;
        if let Some(next) = self.streams[stream].next() {
            self.heap.push(Pending {
                timestamp: next.timestamp,
                stream,
                record: next,
            });
        }
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let mut lower = self.heap.len();
        let mut upper = Some(self.heap.len());
        for stream in &self.streams {
            let (lo, hi) = stream.size_hint();
            lower = lower.saturating_add(lo);
            upper = match (upper, hi) {
                (Some(a), Some(b)) => a.checked_add(b),
                _ => None,
            };
        }
        (lower, upper)
    }
}

impl<I> FusedIterator for MergedRecords<I> where I: FusedIterator<Item = LogRecord> {}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timestamp::parse_log_timestamp;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn rec(source: &str, ms: u32, text: &str) -> LogRecord {
        let ts = parse_log_timestamp(&format!("2021-01-01T00:00:00.{ms:03}+0000")).unwrap();
        LogRecord::new(Arc::from(source), ts, 1, text.to_string())
    }

    fn labels(records: impl Iterator<Item = LogRecord>) -> Vec<String> {
        records.map(|r| r.lines[0].clone()).collect()
    }

    #[test]
    fn test_interleaves_two_streams() {
        let a = vec![rec("a", 1, "t1"), rec("a", 3, "t3")];
        let b = vec![rec("b", 2, "t2")];
        assert_eq!(labels(merge(vec![a, b])), vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn test_output_is_non_decreasing() {
        let a = vec![rec("a", 0, "a0"), rec("a", 5, "a5"), rec("a", 9, "a9")];
        let b = vec![rec("b", 1, "b1"), rec("b", 5, "b5"), rec("b", 6, "b6")];
        let c = vec![rec("c", 2, "c2"), rec("c", 3, "c3"), rec("c", 10, "c10")];
        let merged: Vec<_> = merge(vec![a, b, c]).collect();
        assert_eq!(merged.len(), 9);
        assert!(merged.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_ties_follow_stream_order() {
        let a = vec![rec("a", 5, "a")];
        let b = vec![rec("b", 5, "b")];
        let c = vec![rec("c", 5, "c")];
        assert_eq!(
            labels(merge(vec![a.clone(), b.clone(), c.clone()])),
            vec!["a", "b", "c"]
        );
        assert_eq!(labels(merge(vec![c, a, b])), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_equal_timestamps_within_a_stream_keep_order() {
        let a = vec![rec("a", 5, "first"), rec("a", 5, "second")];
        let b = vec![rec("b", 5, "other")];
        assert_eq!(
            labels(merge(vec![a, b])),
            vec!["first", "second", "other"],
            "stream a wins every tie at the same instant"
        );
    }

    #[test]
    fn test_offsets_compare_as_instants() {
        let early = parse_log_timestamp("2021-01-01T01:00:00.000+0200").unwrap();
        let late = parse_log_timestamp("2021-01-01T00:00:00.000+0000").unwrap();
        let a = vec![LogRecord::new(Arc::from("a"), late, 1, "late".into())];
        let b = vec![LogRecord::new(Arc::from("b"), early, 1, "early".into())];
        assert_eq!(labels(merge(vec![a, b])), vec!["early", "late"]);
    }

    #[test]
    fn test_empty_inputs() {
        let none: Vec<Vec<LogRecord>> = Vec::new();
        assert_eq!(merge(none).count(), 0);

        let a = vec![rec("a", 1, "only")];
        let merged = merge(vec![Vec::new(), a, Vec::new()]);
        assert_eq!(merged.stream_count(), 3);
        assert_eq!(labels(merged), vec!["only"]);
    }

    #[test]
    fn test_holds_at_most_one_record_per_stream() {
        let pulls = Rc::new(Cell::new(0usize));
        let counted = |records: Vec<LogRecord>| {
            let pulls = Rc::clone(&pulls);
            records.into_iter().inspect(move |_| pulls.set(pulls.get() + 1))
        };
        let a = counted(vec![rec("a", 1, "a1"), rec("a", 4, "a4"), rec("a", 7, "a7")]);
        let b = counted(vec![rec("b", 2, "b2"), rec("b", 5, "b5")]);

        let mut merged = merge(vec![a, b]);
        assert_eq!(pulls.get(), 2, "priming pulls one record per stream");
        assert_eq!(merged.pending(), 2);

        assert_eq!(merged.next().unwrap().lines[0], "a1");
        assert_eq!(pulls.get(), 3, "only the drained stream is refilled");
        assert!(merged.pending() <= 2);

        let rest: Vec<_> = merged.by_ref().collect();
        assert_eq!(rest.len(), 4);
        assert_eq!(merged.pending(), 0);
    }

    #[test]
    fn test_size_hint_exact_for_vec_streams() {
        let a = vec![rec("a", 1, "x"), rec("a", 2, "y")];
        let b = vec![rec("b", 1, "z")];
        let merged = merge(vec![a, b]);
        assert_eq!(merged.size_hint(), (3, Some(3)));
    }
}
