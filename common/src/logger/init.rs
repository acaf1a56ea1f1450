use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Installs the global tracing subscriber once per process.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. When `json` is set
/// events are emitted as JSON lines, otherwise as human-readable text.
/// Later calls are no-ops; if another subscriber was already installed
/// (for example by a test harness) it is left in place.
pub fn init_logger(service_name: &'static str, json: bool) {
    LOGGER_INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let base = fmt::layer()
            .with_target(true) // <-- shows crate/module path
            .with_thread_ids(true)
            .with_line_number(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        let installed = if json {
            tracing_subscriber::registry()
                .with(filter)
                .with(base.json())
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(base)
                .try_init()
        };

        match installed {
            Ok(()) => tracing::info!(service = service_name, "logger initialized"),
            Err(e) => tracing::debug!(
                service = service_name,
                error = %e,
                "global subscriber already set; keeping it"
            ),
        }
    });
}
