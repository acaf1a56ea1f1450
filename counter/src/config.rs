use std::path::PathBuf;

use tracing::warn;

use crate::window::{DEFAULT_WINDOW_SECS, Window};

pub const DEFAULT_STORE_FILE: &str = "rs.json";

pub const ENV_WINDOW_SECS: &str = "COUNTER_WINDOW_SECS";
pub const ENV_STORE_PATH: &str = "COUNTER_STORE_PATH";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Trailing interval over which arrivals are counted.
    /// Fixed for the lifetime of the store.
    pub window: Window,

    /// Snapshot file. `None` disables persistence entirely:
    /// nothing is loaded at startup and `dump` is a no-op.
    pub persistence_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            window: Window::default(),
            persistence_path: Some(PathBuf::from(DEFAULT_STORE_FILE)),
        }
    }
}

impl StoreConfig {
    /// In-memory only store with the given window.
    pub fn new(window: Window) -> Self {
        Self {
            window,
            persistence_path: None,
        }
    }

    pub fn with_persistence(mut self, path: impl Into<PathBuf>) -> Self {
        self.persistence_path = normalize_path(path.into());
        self
    }

    pub fn without_persistence(mut self) -> Self {
        self.persistence_path = None;
        self
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `COUNTER_WINDOW_SECS` / `COUNTER_STORE_PATH`
    /// as resolved by `lookup`.
    ///
    /// A window that does not parse, or is zero, falls back to the default.
    /// An empty path disables persistence; an unset path uses `rs.json`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let window = match lookup(ENV_WINDOW_SECS) {
            None => Window::default(),
            Some(raw) => match raw.trim().parse::<u64>().map(Window::from_secs) {
                Ok(Ok(w)) => w,
                _ => {
                    warn!(
                        value = %raw,
                        default_secs = DEFAULT_WINDOW_SECS,
                        "invalid window length; using default"
                    );
                    Window::default()
                }
            },
        };

        let persistence_path = match lookup(ENV_STORE_PATH) {
            None => Some(PathBuf::from(DEFAULT_STORE_FILE)),
            Some(raw) => normalize_path(PathBuf::from(raw)),
        };

        Self {
            window,
            persistence_path,
        }
    }
}

fn normalize_path(p: PathBuf) -> Option<PathBuf> {
    if p.as_os_str().is_empty() {
        None
    } else {
        Some(p)
    }
}
