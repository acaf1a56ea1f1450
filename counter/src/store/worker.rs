use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::Shared;
use crate::metrics::counters::Counters;
use crate::record::Record;

/// Messages accepted by the ingestion worker.
#[derive(Debug)]
pub(crate) enum Ingest {
    Arrival(Record),
    /// Acknowledged once every message queued before it has been applied.
    Flush(oneshot::Sender<()>),
}

/// Single consumer of the ingestion channel and the only writer of new
/// arrivals into the log. Exits when every store handle has been dropped.
pub(crate) async fn run(shared: Arc<Shared>, mut rx: UnboundedReceiver<Ingest>) {
    debug!(
        component = "ingest",
        event = "startup",
        "ingestion worker started"
    );

    while let Some(msg) = rx.recv().await {
        match msg {
            Ingest::Arrival(record) => {
                shared.log.lock().insert(record);
                Counters::add(&shared.counters.ingested, 1);
            }
            Ingest::Flush(ack) => {
                // the flusher may have given up waiting
                let _ = ack.send(());
            }
        }
    }

    info!(
        component = "ingest",
        event = "shutdown",
        "ingestion channel closed"
    );
}
