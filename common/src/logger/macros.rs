use tracing::{Span, field};

use super::TraceId;

/// Create a root span for a request / snapshot / job
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id.as_str(),
        origin = field::Empty
    )
}
