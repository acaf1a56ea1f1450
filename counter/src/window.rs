use std::time::Duration;

use crate::error::ConfigError;
use crate::time::duration_to_ns;

pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Retention horizon of the store. Always non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    length: Duration,
}

impl Window {
    pub fn new(length: Duration) -> Result<Self, ConfigError> {
        if length.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(Self { length })
    }

    pub fn from_secs(secs: u64) -> Result<Self, ConfigError> {
        Self::new(Duration::from_secs(secs))
    }

    pub fn length(&self) -> Duration {
        self.length
    }

    /// Oldest timestamp still inside the window at `now_ns`.
    /// Records strictly older than this are expired.
    pub fn cutoff_ns(&self, now_ns: i64) -> i64 {
        now_ns.saturating_sub(duration_to_ns(self.length))
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            length: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}
