// crates/core/src/config.rs
//! Tracker timing configuration.

use std::time::Duration;

/// Default time between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default delay before the "do not close" warning appears.
pub const DEFAULT_WARNING_DELAY: Duration = Duration::from_millis(3000);

/// Timing knobs for a tracking surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub warning_delay: Duration,
    /// Per-fetch timeout; `None` waits on a hung fetch forever.
    pub fetch_timeout: Option<Duration>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            warning_delay: DEFAULT_WARNING_DELAY,
            fetch_timeout: None,
        }
    }
}

impl TrackerConfig {
    /// Read overrides from the environment, falling back to defaults.
    ///
    /// - `BULKADD_POLL_INTERVAL_MS`
    /// - `BULKADD_WARNING_DELAY_MS`
    /// - `BULKADD_FETCH_TIMEOUT_MS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: env_millis("BULKADD_POLL_INTERVAL_MS").unwrap_or(defaults.poll_interval),
            warning_delay: env_millis("BULKADD_WARNING_DELAY_MS").unwrap_or(defaults.warning_delay),
            fetch_timeout: env_millis("BULKADD_FETCH_TIMEOUT_MS").or(defaults.fetch_timeout),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.poll_interval = interval;
        }
        self
    }

    pub fn with_warning_delay(mut self, delay: Duration) -> Self {
        self.warning_delay = delay;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout.filter(|t| !t.is_zero());
        self
    }
}

/// Zero and unparsable values count as unset.
fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key).ok().and_then(|v| parse_millis(&v))
}

fn parse_millis(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
