use std::collections::VecDeque;

use crate::record::Record;

/// Time-ordered arrival log.
///
/// Front holds the newest record, back the oldest. Insertion is always at
/// the front, so the deque stays sorted by `occurred_at_ns` descending as
/// long as arrivals are pushed in the order they happened.
///
/// Eviction is an explicit step; `len()` never prunes.
#[derive(Debug, Default)]
pub struct EventLog {
    records: VecDeque<Record>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the newest end. O(1) amortized.
    pub fn push_front(&mut self, record: Record) {
        self.records.push_front(record);
    }

    /// Insert keeping the log sorted.
    ///
    /// Arrivals from concurrent producers can reach the ingestion worker
    /// slightly out of timestamp order; those are placed behind every newer
    /// record instead of at the front. The common in-order case is a plain
    /// `push_front`.
    pub fn insert(&mut self, record: Record) {
        match self.records.front() {
            Some(newest) if newest.occurred_at_ns > record.occurred_at_ns => {
                let pos = self
                    .records
                    .partition_point(|r| r.occurred_at_ns > record.occurred_at_ns);
                self.records.insert(pos, record);
            }
            _ => self.records.push_front(record),
        }
    }

    /// Drop records strictly older than `cutoff_ns`, oldest first, and
    /// return how many were removed.
    ///
    /// Stops at the first fresh record: everything in front of it is newer.
    /// O(k) in the number of expired records.
    pub fn evict_older_than(&mut self, cutoff_ns: i64) -> usize {
        let mut evicted = 0;
        while let Some(oldest) = self.records.back() {
            if !oldest.is_older_than(cutoff_ns) {
                break;
            }
            self.records.pop_back();
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest-first traversal, the order snapshots are written in.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().rev()
    }

    /// Replace the whole log.
    ///
    /// Input is normally oldest-first, but any order is accepted: records are
    /// re-sorted so the newest ends up in front. Equal timestamps keep their
    /// relative input order (later input is treated as the later arrival).
    pub fn reset_from<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Record>,
    {
        let mut sorted: Vec<Record> = records.into_iter().collect();
        sorted.sort_by_key(|r| r.occurred_at_ns);

        self.records.clear();
        self.records.reserve(sorted.len());
        for r in sorted {
            self.records.push_front(r);
        }
    }
}
