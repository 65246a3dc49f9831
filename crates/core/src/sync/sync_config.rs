//! Engine-level configuration and cadence constants.

use std::time::Duration;

/// Foreground refresh cadence in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3;

/// Upper bound on a single write round-trip, in seconds.
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;

/// Smallest accepted refresh interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub refresh_interval: Duration,
    pub write_timeout: Duration,
    /// Also fetch coach/prediction/alerts/rewards on every cycle.
    pub insights_enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            write_timeout: Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
            insights_enabled: true,
        }
    }
}
