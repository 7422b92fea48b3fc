//! Per-partition bookkeeping of which records are fully handled.

use std::collections::{BTreeSet, HashMap};

use crate::consumer::RecordOffset;

#[derive(Debug)]
struct PartitionState {
    /// Received records that are not complete yet.
    pending: BTreeSet<i64>,
    highest_seen: i64,
    /// Next offset to read as last committed to the broker.
    committed: i64,
}

/// Tracks completion of received records and derives safe commit positions.
///
/// Records may complete in any order. A partition's commit position only
/// ever covers the contiguous run of completed records starting at the
/// last committed position, so a slow write holds back everything after it.
#[derive(Debug, Default)]
pub struct OffsetTracker {
    partitions: HashMap<(String, i32), PartitionState>,
}

impl OffsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record taken off the stream.
    pub fn track(&mut self, offset: &RecordOffset) {
        let key = (offset.topic.clone(), offset.partition);
        let state = self
            .partitions
            .entry(key)
            .or_insert_with(|| PartitionState {
                pending: BTreeSet::new(),
                highest_seen: offset.offset - 1,
                committed: offset.offset,
            });

        state.pending.insert(offset.offset);
        state.highest_seen = state.highest_seen.max(offset.offset);
    }

    /// Mark a record as fully handled.
    pub fn complete(&mut self, offset: &RecordOffset) {
        if let Some(state) = self
            .partitions
            .get_mut(&(offset.topic.clone(), offset.partition))
        {
            state.pending.remove(&offset.offset);
        }
    }

    /// Number of received records that are not complete yet.
    pub fn in_flight(&self) -> usize {
        self.partitions.values().map(|s| s.pending.len()).sum()
    }

    /// Positions that can be committed now, one per advanced partition.
    ///
    /// Each entry is the next offset to read. Nothing is recorded until
    /// [`mark_committed`](Self::mark_committed) is called.
    pub fn committable(&self) -> Vec<RecordOffset> {
        let mut offsets: Vec<RecordOffset> = self
            .partitions
            .iter()
            .filter_map(|((topic, partition), state)| {
                let next = state
                    .pending
                    .iter()
                    .next()
                    .copied()
                    .unwrap_or(state.highest_seen + 1);
                (next > state.committed).then(|| RecordOffset::new(topic.clone(), *partition, next))
            })
            .collect();

        offsets.sort_by(|a, b| (&a.topic, a.partition).cmp(&(&b.topic, b.partition)));
        offsets
    }

    /// Record positions the broker accepted.
    pub fn mark_committed(&mut self, offsets: &[RecordOffset]) {
        for offset in offsets {
            if let Some(state) = self
                .partitions
                .get_mut(&(offset.topic.clone(), offset.partition))
            {
                state.committed = state.committed.max(offset.offset);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(partition: i32, offset: i64) -> RecordOffset {
        RecordOffset::new("product-search-events", partition, offset)
    }

    #[test]
    fn test_nothing_to_commit_initially() {
        let mut tracker = OffsetTracker::new();
        assert!(tracker.committable().is_empty());

        tracker.track(&at(0, 10));
        assert!(tracker.committable().is_empty());
        assert_eq!(tracker.in_flight(), 1);
    }

    #[test]
    fn test_completed_prefix_is_committable() {
        let mut tracker = OffsetTracker::new();
        for offset in 10..13 {
            tracker.track(&at(0, offset));
        }

        tracker.complete(&at(0, 10));
        tracker.complete(&at(0, 11));

        assert_eq!(tracker.committable(), vec![at(0, 12)]);
    }

    #[test]
    fn test_gap_holds_back_later_completions() {
        let mut tracker = OffsetTracker::new();
        for offset in 0..4 {
            tracker.track(&at(0, offset));
        }

        tracker.complete(&at(0, 1));
        tracker.complete(&at(0, 2));
        tracker.complete(&at(0, 3));
        assert!(tracker.committable().is_empty());

        tracker.complete(&at(0, 0));
        assert_eq!(tracker.committable(), vec![at(0, 4)]);
    }

    #[test]
    fn test_mark_committed_stops_repeats() {
        let mut tracker = OffsetTracker::new();
        tracker.track(&at(0, 5));
        tracker.complete(&at(0, 5));

        let offsets = tracker.committable();
        assert_eq!(offsets, vec![at(0, 6)]);

        tracker.mark_committed(&offsets);
        assert!(tracker.committable().is_empty());
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn test_partitions_are_independent() {
        let mut tracker = OffsetTracker::new();
        tracker.track(&at(0, 0));
        tracker.track(&at(1, 100));
        tracker.track(&at(1, 101));

        tracker.complete(&at(1, 100));
        tracker.complete(&at(1, 101));

        assert_eq!(tracker.committable(), vec![at(1, 102)]);
    }

    #[test]
    fn test_redelivered_record_below_commit_does_not_regress() {
        let mut tracker = OffsetTracker::new();
        tracker.track(&at(0, 3));
        tracker.complete(&at(0, 3));
        let offsets = tracker.committable();
        tracker.mark_committed(&offsets);

        tracker.track(&at(0, 2));
        tracker.complete(&at(0, 2));

        assert!(tracker.committable().is_empty());
    }
}
