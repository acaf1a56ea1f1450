use serde::{Deserialize, Serialize};

/// One arrival, as logged in memory and in the snapshot file.
///
/// Serialized as `{"requested_at": <ns since epoch>, "remote_address": "<origin>"}`.
/// Missing fields decode as zero values: an entry without an address is still
/// counted, an entry without a timestamp reads as the epoch and expires on load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Arrival time (ns since the Unix epoch)
    #[serde(rename = "requested_at", default)]
    pub occurred_at_ns: i64,

    /// Requester identity, diagnostics only
    #[serde(rename = "remote_address", default)]
    pub origin: String,
}

impl Record {
    pub fn new(occurred_at_ns: i64, origin: impl Into<String>) -> Self {
        Self {
            occurred_at_ns,
            origin: origin.into(),
        }
    }

    /// True when the arrival happened strictly before `cutoff_ns`.
    pub fn is_older_than(&self, cutoff_ns: i64) -> bool {
        self.occurred_at_ns < cutoff_ns
    }
}
