//! Reconnect scheduling for the event stream client.
//!
//! After an unexpected closure the supervisor asks the
//! [`ReconnectPolicy`] whether another attempt is allowed and how long
//! to wait before it. The default policy waits a fixed interval; a
//! multiplier above `1.0` turns it into exponential backoff clamped at
//! [`ReconnectPolicy::max_delay`]. No jitter is applied.

use std::time::Duration;

use crate::config::{DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL_MS};

/// Tunable parameters for the retry schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnection attempt.
    pub interval: Duration,
    /// Reconnect ceiling. Zero disables automatic reconnection.
    pub max_attempts: u32,
    /// Factor by which the delay grows after each attempt. `1.0` keeps
    /// the delay fixed; values below `1.0` are treated as `1.0`.
    pub multiplier: f64,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(
            Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
            DEFAULT_MAX_RECONNECT_ATTEMPTS,
        )
    }
}

impl ReconnectPolicy {
    /// Wait `interval` before every attempt, at most `max_attempts` times.
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            multiplier: 1.0,
            max_delay: interval,
        }
    }

    /// Grow the delay by `multiplier` after each attempt, capped at
    /// `max_delay`.
    pub fn with_backoff(mut self, multiplier: f64, max_delay: Duration) -> Self {
        self.multiplier = multiplier;
        self.max_delay = max_delay.max(self.interval);
        self
    }

    /// Whether another attempt may be scheduled once `attempts_made`
    /// retries have already been scheduled since the last successful
    /// connection.
    pub fn allows(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let ms = self.interval.as_millis() as f64 * self.multiplier.max(1.0).powi(exponent);
        // Float-to-int casts saturate, so an overflowing product lands on u64::MAX.
        Duration::from_millis(ms as u64)
            .min(self.max_delay)
            .max(self.interval)
    }
}
