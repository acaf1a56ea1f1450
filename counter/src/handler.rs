//! Server-agnostic request handling for the single `/count` route.
//!
//! The transport layer maps its request onto `handle(path, origin)` and
//! writes the returned status, content type and body back unchanged.

use common::logger::{TraceId, root_span};
use tracing::{debug, field, warn};

use crate::store::{DumpOutcome, WindowStore};

pub const COUNT_PATH: &str = "/count";

pub const STATUS_OK: u16 = 200;
pub const STATUS_NOT_FOUND: u16 = 404;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Clone)]
pub struct CountHandler {
    store: WindowStore,
}

impl CountHandler {
    pub fn new(store: WindowStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &WindowStore {
        &self.store
    }

    /// Answers with the number of requests seen in the window, then records
    /// this one. The reported count therefore never includes the caller.
    pub fn handle(&self, path: &str, origin: &str) -> CountResponse {
        let span = root_span("count_request", &TraceId::default());
        let _enter = span.enter();
        span.record("origin", field::display(origin));

        if path != COUNT_PATH {
            debug!(path, "unknown route");
            return CountResponse {
                status: STATUS_NOT_FOUND,
                content_type: TEXT_PLAIN,
                body: "Not Found\n".to_string(),
            };
        }

        let count = self.store.count();
        self.store.record(origin);

        debug!(count, "served count");
        CountResponse {
            status: STATUS_OK,
            content_type: TEXT_PLAIN,
            body: format!("{count}\n"),
        }
    }

    /// Final best-effort snapshot on process shutdown. Failures are logged,
    /// never propagated.
    pub async fn shutdown(&self) -> Option<DumpOutcome> {
        match self.store.dump().await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, "final snapshot failed; window state not persisted");
                None
            }
        }
    }
}
