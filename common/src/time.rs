//! Time utilities and constants for fxwatch.

use chrono::Duration;

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// Default interval between scheduled refresh cycles (1 hour).
    pub fn default_refresh_interval() -> Duration {
        Duration::hours(1)
    }

    /// Default budget for a single provider call (10 seconds).
    pub fn default_provider_timeout() -> Duration {
        Duration::seconds(10)
    }

    /// Shortest trend window expressible in hours.
    pub const MIN_TREND_HOURS: u32 = 12;
}

/// Duration extensions for convenient construction.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}
