pub mod config;
pub mod event_log;
pub mod handler;
pub mod metrics;
pub mod record;
pub mod store;
pub mod window;

pub mod error;
pub mod time;

pub use config::StoreConfig;
pub use error::{ConfigError, PersistError};
pub use handler::{CountHandler, CountResponse};
pub use record::Record;
pub use store::{DumpOutcome, LoadOutcome, RestoreSummary, WindowStore};
pub use window::Window;
