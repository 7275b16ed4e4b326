//! Injectable concurrency-limit policies.
//!
//! The limit is a function of the current wall-clock time, injected into
//! the executor so schedules can be tested without touching the system
//! clock.

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Computes the pool limit for one `run` invocation.
pub type ConcurrencyPolicy = Arc<dyn Fn(DateTime<Local>) -> usize + Send + Sync>;

/// A policy that ignores the clock.
#[must_use]
pub fn fixed_limit(limit: usize) -> ConcurrencyPolicy {
    Arc::new(move |_now| limit)
}

/// Hour-of-day schedule: a lower limit inside the peak window, a higher
/// one outside it.
///
/// The window is `[peak_start_hour, peak_end_hour)` and may wrap past
/// midnight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyLimits {
    /// First hour (0-23) of the peak window.
    pub peak_start_hour: u32,
    /// Hour (0-23) the peak window ends, exclusive.
    pub peak_end_hour: u32,
    /// Limit inside the peak window.
    pub peak_limit: usize,
    /// Limit outside the peak window.
    pub off_peak_limit: usize,
}

impl Default for HourlyLimits {
    fn default() -> Self {
        Self {
            peak_start_hour: 9,
            peak_end_hour: 19,
            peak_limit: 2,
            off_peak_limit: 4,
        }
    }
}

impl HourlyLimits {
    /// Returns the limit in force at `now`.
    #[must_use]
    pub fn limit_at(&self, now: DateTime<Local>) -> usize {
        let hour = now.hour();
        let in_peak = if self.peak_start_hour <= self.peak_end_hour {
            hour >= self.peak_start_hour && hour < self.peak_end_hour
        } else {
            hour >= self.peak_start_hour || hour < self.peak_end_hour
        };
        if in_peak {
            self.peak_limit
        } else {
            self.off_peak_limit
        }
    }

    /// Wraps the schedule into a [`ConcurrencyPolicy`].
    #[must_use]
    pub fn into_policy(self) -> ConcurrencyPolicy {
        Arc::new(move |now| self.limit_at(now))
    }
}
