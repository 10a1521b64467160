//! Stream utilities: time-ordered k-way merge and half-open slicing.
//!
//! Works over anything [`Timestamped`], so per-source event iterators (depth,
//! trades, mark prices, ...) merge into the single stream the engine
//! consumes.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::{Timestamped, TimeMs};

struct MergeEntry<T> {
    time_ms: TimeMs,
    /// Source-stream index; breaks ties so equal timestamps keep stream
    /// registration order.
    source: usize,
    item: T,
}

impl<T> PartialEq for MergeEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.time_ms == other.time_ms && self.source == other.source
    }
}

impl<T> Eq for MergeEntry<T> {}

impl<T> PartialOrd for MergeEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for MergeEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time_ms, self.source).cmp(&(other.time_ms, other.source))
    }
}

/// Iterator returned by [`merge_event_streams`].
pub struct MergedStreams<I: Iterator> {
    heap: BinaryHeap<Reverse<MergeEntry<I::Item>>>,
    sources: Vec<I>,
}

impl<T, I> Iterator for MergedStreams<I>
where
    T: Timestamped,
    I: Iterator<Item = T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let Reverse(entry) = self.heap.pop()?;
        if let Some(next) = self.sources[entry.source].next() {
            self.heap.push(Reverse(MergeEntry {
                time_ms: next.event_time_ms(),
                source: entry.source,
                item: next,
            }));
        }
        Some(entry.item)
    }
}

/// Merge multiple time-ordered streams into one, ordered by
/// `event_time_ms`.
///
/// Buffers exactly one item per source. Ties are broken by source
/// registration order, so the merge is stable and deterministic.
pub fn merge_event_streams<T, S>(streams: Vec<S>) -> MergedStreams<S::IntoIter>
where
    T: Timestamped,
    S: IntoIterator<Item = T>,
{
    let mut sources: Vec<S::IntoIter> = Vec::with_capacity(streams.len());
    let mut heap = BinaryHeap::with_capacity(streams.len());

    for stream in streams {
        let mut it = stream.into_iter();
        let source = sources.len();
        if let Some(first) = it.next() {
            heap.push(Reverse(MergeEntry {
                time_ms: first.event_time_ms(),
                source,
                item: first,
            }));
        }
        sources.push(it);
    }

    MergedStreams { heap, sources }
}

/// Slice a time-ordered stream to `[start_ms, end_ms)`.
///
/// Items with `event_time_ms < start_ms` are skipped; iteration stops at the
/// first item with `event_time_ms >= end_ms` (the input is assumed ordered,
/// allowing early termination).
pub fn slice_event_stream<T: Timestamped>(
    events: impl IntoIterator<Item = T>,
    start_ms: Option<TimeMs>,
    end_ms: Option<TimeMs>,
) -> impl Iterator<Item = T> {
    events
        .into_iter()
        .skip_while(move |ev| start_ms.is_some_and(|start| ev.event_time_ms() < start))
        .take_while(move |ev| end_ms.is_none_or(|end| ev.event_time_ms() < end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Stamp {
        t: TimeMs,
        tag: &'static str,
    }

    impl Timestamped for Stamp {
        fn event_time_ms(&self) -> TimeMs {
            self.t
        }
    }

    fn s(t: TimeMs, tag: &'static str) -> Stamp {
        Stamp { t, tag }
    }

    #[test]
    fn merge_orders_by_time() {
        let a = vec![s(1, "a"), s(4, "a"), s(7, "a")];
        let b = vec![s(2, "b"), s(3, "b"), s(9, "b")];
        let merged: Vec<TimeMs> = merge_event_streams(vec![a, b])
            .map(|e| e.t)
            .collect();
        assert_eq!(merged, vec![1, 2, 3, 4, 7, 9]);
    }

    #[test]
    fn merge_ties_keep_stream_registration_order() {
        let a = vec![s(5, "a")];
        let b = vec![s(5, "b")];
        let c = vec![s(5, "c")];
        let merged: Vec<&str> = merge_event_streams(vec![a, b, c])
            .map(|e| e.tag)
            .collect();
        assert_eq!(merged, vec!["a", "b", "c"]);
    }

    #[test]
    fn merge_handles_empty_streams() {
        let a: Vec<Stamp> = vec![];
        let b = vec![s(1, "b")];
        let merged: Vec<TimeMs> = merge_event_streams(vec![a, b]).map(|e| e.t).collect();
        assert_eq!(merged, vec![1]);

        let none: Vec<Vec<Stamp>> = vec![];
        assert_eq!(merge_event_streams(none).count(), 0);
    }

    #[test]
    fn merge_is_non_decreasing() {
        let a = vec![s(1, "a"), s(5, "a"), s(5, "a"), s(8, "a")];
        let b = vec![s(2, "b"), s(5, "b"), s(6, "b")];
        let times: Vec<TimeMs> = merge_event_streams(vec![a, b]).map(|e| e.t).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn slice_is_half_open() {
        let events = vec![s(1, "x"), s(2, "x"), s(3, "x"), s(4, "x")];
        let sliced: Vec<TimeMs> = slice_event_stream(events, Some(2), Some(4))
            .map(|e| e.t)
            .collect();
        assert_eq!(sliced, vec![2, 3]);
    }

    #[test]
    fn slice_without_bounds_passes_through() {
        let events = vec![s(1, "x"), s(2, "x")];
        let sliced: Vec<TimeMs> = slice_event_stream(events, None, None).map(|e| e.t).collect();
        assert_eq!(sliced, vec![1, 2]);
    }

    #[test]
    fn slice_stops_at_end_without_scanning_rest() {
        // The tail is unordered garbage past end_ms; early termination means
        // it is never observed.
        let events = vec![s(1, "x"), s(5, "x"), s(2, "x")];
        let sliced: Vec<TimeMs> = slice_event_stream(events, None, Some(5)).map(|e| e.t).collect();
        assert_eq!(sliced, vec![1]);
    }
}
