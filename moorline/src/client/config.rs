//! Client configuration.

use std::time::Duration;

use crate::connection::{RetryPolicy, DEFAULT_BACKOFF_DELAY};

/// Configuration for a client session.
///
/// Groups the server endpoint with the connection retry behavior, providing
/// sensible defaults while allowing customization.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use moorline::client::ClientConfig;
///
/// // Using defaults
/// let config = ClientConfig::new("127.0.0.1", 8888);
/// assert_eq!(config.max_retries(), 0);
/// assert!(config.timeout_per_attempt().is_none());
///
/// // Custom configuration
/// let config = ClientConfig::new("example.net", 8888)
///     .with_max_retries(3)
///     .with_timeout_per_attempt(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server hostname or IP address
    host: String,
    /// Server TCP port
    port: u16,
    /// Number of extra connection attempts after the first fails
    max_retries: u32,
    /// Per-attempt connect deadline (unbounded when `None`)
    timeout_per_attempt: Option<Duration>,
    /// Fixed delay between connection attempts
    backoff_delay: Duration,
}

impl ClientConfig {
    /// Create a configuration for the given endpoint with default retry
    /// behavior: a single attempt, no per-attempt deadline.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            max_retries: 0,
            timeout_per_attempt: None,
            backoff_delay: DEFAULT_BACKOFF_DELAY,
        }
    }

    /// Set the number of extra connection attempts after the first fails.
    ///
    /// Only refused and timed-out attempts are retried. Default: 0 retries,
    /// meaning a single attempt.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the deadline for a single connection attempt.
    ///
    /// An attempt that exceeds it counts as a timeout and is retryable.
    /// Default: no deadline.
    pub fn with_timeout_per_attempt(mut self, timeout: Duration) -> Self {
        self.timeout_per_attempt = Some(timeout);
        self
    }

    /// Set the fixed delay between connection attempts. Default: 1 second.
    pub fn with_backoff_delay(mut self, delay: Duration) -> Self {
        self.backoff_delay = delay;
        self
    }

    /// Get the server hostname or IP address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the server TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the number of extra connection attempts after the first.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the per-attempt connect deadline, if one is set.
    pub fn timeout_per_attempt(&self) -> Option<Duration> {
        self.timeout_per_attempt
    }

    /// Get the fixed delay between connection attempts.
    pub fn backoff_delay(&self) -> Duration {
        self.backoff_delay
    }

    /// The retry policy this configuration describes.
    pub fn retry_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::new(self.max_retries).with_backoff_delay(self.backoff_delay);
        if let Some(timeout) = self.timeout_per_attempt {
            policy = policy.with_timeout_per_attempt(timeout);
        }
        policy
    }
}
