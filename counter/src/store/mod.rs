//! Sliding-window request store.
//!
//! `WindowStore` owns the arrival log and serializes every mutation of it:
//! - `record` timestamps an arrival and queues it for the ingestion worker
//!   without blocking on the log.
//! - one background task drains the queue and inserts under the log lock.
//! - `count` and `snapshot` evict expired records under the same lock
//!   before reading, so callers never see entries older than the window.
//!
//! Consistency: an arrival queued by `record` but not yet drained is not
//! counted. `flush` waits for the queue to catch up when a settled count
//! is needed.
//!
//! Persistence is best-effort. `load` never fails the caller, `dump`
//! reports errors, and neither affects the live counting path.

mod persist;
mod worker;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use common::logger::warn_if_slow;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::config::StoreConfig;
use crate::error::PersistError;
use crate::event_log::EventLog;
use crate::metrics::counters::{Counters, StoreStats};
use crate::record::Record;
use crate::time::{Clock, SystemClock};
use crate::window::Window;
use worker::Ingest;

/// Result of a snapshot load. Loading is never fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No persistence path configured.
    Disabled,
    /// The snapshot file does not exist (cold start).
    Missing,
    /// The file exists but could not be read.
    Unreadable,
    /// The file could not be parsed; the log was left untouched.
    Malformed,
    /// The log was replaced with the snapshot's unexpired records.
    Restored { kept: usize, expired: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DumpOutcome {
    /// No persistence path configured.
    Disabled,
    Written { records: usize },
}

/// Outcome of [`WindowStore::restore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub kept: usize,
    pub expired: usize,
}

pub(crate) struct Shared {
    window: Window,
    persistence_path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    pub(crate) log: Mutex<EventLog>,
    pub(crate) counters: Counters,
    /// Serializes dumps so two writers never share the tmp file.
    dump_guard: tokio::sync::Mutex<()>,
}

/// Handle to the store. Cheap to clone; all clones share one log and one
/// ingestion worker. The worker stops once the last handle is dropped.
#[derive(Clone)]
pub struct WindowStore {
    shared: Arc<Shared>,
    tx: mpsc::UnboundedSender<Ingest>,
}

impl WindowStore {
    /// Creates the store, restores the snapshot (if any) and starts the
    /// ingestion worker. Must be called from within a tokio runtime.
    pub async fn open(config: StoreConfig) -> Self {
        Self::open_with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        let shared = Arc::new(Shared {
            window: config.window,
            persistence_path: config.persistence_path,
            clock,
            log: Mutex::new(EventLog::new()),
            counters: Counters::default(),
            dump_guard: tokio::sync::Mutex::new(()),
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let store = Self {
            shared: Arc::clone(&shared),
            tx,
        };

        let outcome = store.load().await;
        debug!(?outcome, "initial snapshot load finished");

        tokio::spawn(worker::run(shared, rx));

        info!(
            window_secs = store.shared.window.length().as_secs_f64(),
            persistence = ?store.shared.persistence_path,
            "window store opened"
        );

        store
    }

    pub fn window(&self) -> Window {
        self.shared.window
    }

    pub fn persistence_path(&self) -> Option<&Path> {
        self.shared.persistence_path.as_deref()
    }

    pub fn stats(&self) -> StoreStats {
        self.shared.counters.snapshot()
    }

    /// Queues one arrival stamped with the current time. Never blocks on
    /// the log and never reports failure to the caller.
    pub fn record(&self, origin: impl Into<String>) {
        let record = Record::new(self.shared.clock.now_ns(), origin);
        Counters::add(&self.shared.counters.submitted, 1);

        if self.tx.send(Ingest::Arrival(record)).is_err() {
            Counters::add(&self.shared.counters.dropped, 1);
            debug!("ingestion worker gone; arrival dropped");
        }
    }

    /// Waits until every arrival this handle queued before the call has
    /// been applied to the log. Returns immediately if the worker is gone.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Ingest::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }

    /// Number of arrivals inside the trailing window as of now.
    pub fn count(&self) -> usize {
        let mut log = self.shared.log.lock();
        self.evict_locked(&mut log);
        log.len()
    }

    /// Unexpired records, oldest first.
    pub fn snapshot(&self) -> Vec<Record> {
        let mut log = self.shared.log.lock();
        self.evict_locked(&mut log);
        log.iter_oldest_first().cloned().collect()
    }

    /// Replaces the log with `records`, dropping any already outside the
    /// window. Input order does not matter.
    pub fn restore(&self, records: Vec<Record>) -> RestoreSummary {
        let mut log = self.shared.log.lock();
        let cutoff = self.shared.window.cutoff_ns(self.shared.clock.now_ns());

        let total = records.len();
        let fresh: Vec<Record> = records
            .into_iter()
            .filter(|r| !r.is_older_than(cutoff))
            .collect();
        let summary = RestoreSummary {
            kept: fresh.len(),
            expired: total - fresh.len(),
        };

        log.reset_from(fresh);
        drop(log);

        Counters::add(&self.shared.counters.restored, summary.kept);
        Counters::add(&self.shared.counters.expired_on_restore, summary.expired);
        summary
    }

    /// Restores the log from the configured snapshot file.
    ///
    /// A missing, unreadable or malformed file is logged and leaves the
    /// current log untouched.
    #[instrument(skip(self))]
    pub async fn load(&self) -> LoadOutcome {
        let Some(path) = self.shared.persistence_path.as_deref() else {
            return LoadOutcome::Disabled;
        };

        match persist::read_snapshot(path).await {
            Ok(Some(records)) => {
                let RestoreSummary { kept, expired } = self.restore(records);
                info!(
                    path = %path.display(),
                    kept,
                    expired,
                    "restored snapshot"
                );
                LoadOutcome::Restored { kept, expired }
            }
            Ok(None) => {
                info!(path = %path.display(), "no snapshot found; starting empty");
                LoadOutcome::Missing
            }
            Err(e @ PersistError::Decode { .. }) => {
                warn!(error = %e, "ignoring malformed snapshot");
                LoadOutcome::Malformed
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable snapshot");
                LoadOutcome::Unreadable
            }
        }
    }

    /// Writes the unexpired records to the configured snapshot file.
    ///
    /// Arrivals still queued for ingestion are not included.
    #[instrument(skip(self))]
    pub async fn dump(&self) -> Result<DumpOutcome, PersistError> {
        let Some(path) = self.shared.persistence_path.as_deref() else {
            return Ok(DumpOutcome::Disabled);
        };

        let _guard = self.shared.dump_guard.lock().await;
        let records = self.snapshot();

        warn_if_slow(
            "snapshot_dump",
            Duration::from_millis(250),
            persist::write_snapshot(path, &records),
        )
        .await?;

        debug!(path = %path.display(), records = records.len(), "snapshot written");
        Ok(DumpOutcome::Written {
            records: records.len(),
        })
    }

    fn evict_locked(&self, log: &mut EventLog) {
        let cutoff = self.shared.window.cutoff_ns(self.shared.clock.now_ns());
        let evicted = log.evict_older_than(cutoff);
        Counters::add(&self.shared.counters.evicted, evicted);
    }
}
