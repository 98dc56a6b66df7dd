//! Retry policy for connection establishment.

use std::time::Duration;

/// Fixed wait inserted between failed connection attempts.
pub const DEFAULT_BACKOFF_DELAY: Duration = Duration::from_secs(1);

/// Bounds for connection establishment: how many times to retry, how long a
/// single attempt may take, and how long to wait between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,

    /// Per-attempt limit; `None` lets an attempt run until the OS gives up.
    pub timeout_per_attempt: Option<Duration>,

    /// Fixed wait between a retryable failure and the next attempt.
    pub backoff_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            timeout_per_attempt: None,
            backoff_delay: DEFAULT_BACKOFF_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given retry budget and default timing.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout_per_attempt(mut self, timeout: Duration) -> Self {
        self.timeout_per_attempt = Some(timeout);
        self
    }

    /// Sets the wait between failed attempts.
    pub fn with_backoff_delay(mut self, delay: Duration) -> Self {
        self.backoff_delay = delay;
        self
    }

    /// Total number of attempts the policy allows.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
