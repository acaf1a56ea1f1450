use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Debug, Default)]
pub struct Counters {
    // ingestion path
    pub submitted: AtomicU64,
    pub ingested: AtomicU64,
    pub dropped: AtomicU64,

    // window maintenance
    pub evicted: AtomicU64,
    pub restored: AtomicU64,
    pub expired_on_restore: AtomicU64,
}

/// Point-in-time copy of [`Counters`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub submitted: u64,
    pub ingested: u64,
    pub dropped: u64,
    pub evicted: u64,
    pub restored: u64,
    pub expired_on_restore: u64,
}

impl StoreStats {
    /// Arrivals accepted by `record` but not yet applied to the log.
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.ingested)
            .saturating_sub(self.dropped)
    }
}

impl Counters {
    pub fn add(counter: &AtomicU64, n: usize) {
        if n > 0 {
            counter.fetch_add(n as u64, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StoreStats {
        StoreStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            ingested: self.ingested.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            restored: self.restored.load(Ordering::Relaxed),
            expired_on_restore: self.expired_on_restore.load(Ordering::Relaxed),
        }
    }
}
