//! Wall-clock source for arrival timestamps.
//!
//! All timestamps are signed nanoseconds since the Unix epoch, the same
//! encoding the snapshot file uses, so in-memory and persisted records
//! compare directly.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of "now" for the store.
pub trait Clock: Send + Sync + 'static {
    fn now_ns(&self) -> i64;
}

/// Real wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ns(&self) -> i64 {
        now_ns()
    }
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
///
/// A clock set before the epoch reads as 0.
pub fn now_ns() -> i64 {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    duration_to_ns(since_epoch)
}

/// Saturating conversion; i64 nanoseconds cover roughly 292 years.
pub fn duration_to_ns(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

/// Manually driven clock for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ns: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ns: i64) -> Self {
        Self {
            now_ns: AtomicI64::new(start_ns),
        }
    }

    pub fn set_ns(&self, ns: i64) {
        self.now_ns.store(ns, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now_ns
            .fetch_add(duration_to_ns(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> i64 {
        self.now_ns.load(Ordering::SeqCst)
    }
}
