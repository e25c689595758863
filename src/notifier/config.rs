//! Configuration for the notifier

use std::time::Duration;

use crate::error::ConfigError;

/// Default pause between provider requests.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(500);

/// Default bound on a single provider call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Fixed sleep before every provider request. Must be non-zero.
    pub poll_delay: Duration,
    /// Deadline for each provider call; `None` lets calls block indefinitely.
    pub request_timeout: Option<Duration>,
    /// Name of the poll thread.
    pub thread_name: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            poll_delay: DEFAULT_POLL_DELAY,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            thread_name: "redalert-notifier".to_string(),
        }
    }
}

impl NotifierConfig {
    /// Checks the values that would make the loop misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_delay.is_zero() {
            return Err(ConfigError::InvalidDelay {
                reason: "poll delay must be greater than zero".to_string(),
            });
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::InvalidDelay {
                reason: "request timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
