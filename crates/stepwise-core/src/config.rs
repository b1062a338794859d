//! Engine configuration.
//!
//! Every knob has the production default; tests and the CLI override
//! individual fields through the `with_*` methods.

use std::time::Duration;

use jiff::{tz::TimeZone, SignedDuration};

use crate::generation::GenerationErrorKind;

/// Retry behaviour for a single generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per occurrence, including the first
    pub max_attempts: u32,
    /// Wait after the service signals rate limiting
    pub rate_limit_backoff: Duration,
    /// Wait after any other transient failure
    pub transient_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_backoff: Duration::from_secs(5),
            transient_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// How long to wait before retrying after an error of `kind`.
    pub fn backoff_for(&self, kind: GenerationErrorKind) -> Duration {
        match kind {
            GenerationErrorKind::RateLimited => self.rate_limit_backoff,
            _ => self.transient_backoff,
        }
    }
}

/// Tunables for scheduling, generation and monitoring.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Zone occurrence dates are anchored in
    pub time_zone: TimeZone,
    pub retry: RetryPolicy,
    /// Limit on a single upstream generation call
    pub call_timeout: Duration,
    /// Watchdog around one whole generation run
    pub run_timeout: Duration,
    /// Minimum spacing between upstream generation calls
    pub throttle_interval: Duration,
    /// Age after which a pending or queued run with no steps counts as abandoned
    pub stale_after: SignedDuration,
    /// Minimum spacing between two daily-trigger checks of the same goal
    pub min_check_interval: SignedDuration,
    /// Number of upcoming actionable steps shown before the rest is collapsed
    pub upcoming_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_zone: TimeZone::system(),
            retry: RetryPolicy::default(),
            call_timeout: Duration::from_secs(30),
            run_timeout: Duration::from_secs(120),
            throttle_interval: Duration::from_millis(500),
            stale_after: SignedDuration::from_mins(3),
            min_check_interval: SignedDuration::from_hours(12),
            upcoming_limit: 4,
        }
    }
}

impl EngineConfig {
    pub fn with_time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = interval;
        self
    }

    pub fn with_stale_after(mut self, stale_after: SignedDuration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_min_check_interval(mut self, interval: SignedDuration) -> Self {
        self.min_check_interval = interval;
        self
    }

    pub fn with_upcoming_limit(mut self, limit: usize) -> Self {
        self.upcoming_limit = limit;
        self
    }
}
