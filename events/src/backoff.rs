//! Exponential backoff policy for broker reconnect attempts.

use std::time::Duration;

/// Backoff configuration for the publisher's drain loop.
///
/// # Default Values
///
/// - `max_attempts`: 10
/// - `base_delay`: 300ms
/// - `max_delay`: 30 seconds
/// - `multiplier`: 1.5
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum consecutive transient failures before the drain loop gives
    /// up until the next publish.
    pub max_attempts: usize,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap on the computed delay.
    pub max_delay: Duration,
    /// Multiplier applied per attempt.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(30),
            multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    /// Delay for a given attempt number (0-based):
    /// `base_delay * multiplier^attempt`, capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return self.base_delay;
        }

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay_ms = (self.base_delay.as_millis() as f64
            * self.multiplier.powi(i32::try_from(attempt).unwrap_or(i32::MAX)))
            as u64;

        let delay = Duration::from_millis(delay_ms);
        delay.min(self.max_delay)
    }
}
