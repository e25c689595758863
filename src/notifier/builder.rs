//! Fluent construction of an [`AlertNotifier`].

use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, NotifierError, NotifierResult};
use crate::failure::FailureHandler;
use crate::listener::AlertListener;
use crate::provider::{AlertProvider, TimeoutProvider};

use super::config::NotifierConfig;
use super::handle::NotifierHandle;
use super::AlertNotifier;

/// Builder for [`AlertNotifier`].
///
/// A provider, a failure handler and at least one listener are required.
///
/// # Example
/// ```rust,ignore
/// let notifier = NotifierBuilder::new()
///     .provider(FeedProvider::new(fetch_feed))
///     .poll_delay(Duration::from_millis(500))
///     .on_failure(LimitedFailureHandler::new(5, LoggingFailureHandler))
///     .on_alert(|alert: &Alert| println!("{alert}"))
///     .build()?;
/// let handle = notifier.listen()?;
/// ```
#[derive(Default)]
pub struct NotifierBuilder {
    provider: Option<Arc<dyn AlertProvider>>,
    config: NotifierConfig,
    failure: Option<Arc<dyn FailureHandler>>,
    listeners: Vec<Arc<dyn AlertListener>>,
}

impl std::fmt::Debug for NotifierBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierBuilder")
            .field("has_provider", &self.provider.is_some())
            .field("config", &self.config)
            .field("has_failure_handler", &self.failure.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl NotifierBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alert provider (required).
    #[must_use]
    pub fn provider<P: AlertProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: NotifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the delay before every provider request (default: 500ms).
    #[must_use]
    pub fn poll_delay(mut self, delay: Duration) -> Self {
        self.config.poll_delay = delay;
        self
    }

    /// Bound each provider call (default: 10s). `None` disables the bound.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the poll thread name.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Set the provider failure handler (required).
    #[must_use]
    pub fn on_failure<H: FailureHandler + 'static>(self, handler: H) -> Self {
        self.on_failure_shared(Arc::new(handler))
    }

    /// Set a failure handler that is also held elsewhere.
    #[must_use]
    pub fn on_failure_shared(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.failure = Some(handler);
        self
    }

    /// Add a listener for new alerts (at least one required).
    #[must_use]
    pub fn on_alert<L: AlertListener + 'static>(self, listener: L) -> Self {
        self.on_alert_shared(Arc::new(listener))
    }

    /// Add a shared listener. The same `Arc` added twice is registered once.
    #[must_use]
    pub fn on_alert_shared(mut self, listener: Arc<dyn AlertListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Validate and build the notifier without starting it.
    ///
    /// Returns `ConfigError::MissingField` for a missing provider or failure
    /// handler, `ConfigError::NoListeners` when no listener was added and
    /// `ConfigError::InvalidDelay` for a zero delay or timeout.
    pub fn build(self) -> NotifierResult<AlertNotifier> {
        let provider = self.provider.ok_or_else(|| ConfigError::MissingField {
            field: "provider".to_string(),
        })?;

        self.config.validate()?;

        let failure = self.failure.ok_or_else(|| ConfigError::MissingField {
            field: "failure_handler".to_string(),
        })?;

        if self.listeners.is_empty() {
            return Err(ConfigError::NoListeners.into());
        }

        let provider: Arc<dyn AlertProvider> = match self.config.request_timeout {
            Some(timeout) => Arc::new(TimeoutProvider::spawn(provider, timeout).map_err(|e| {
                NotifierError::internal(format!("failed to spawn provider worker: {e}"))
            })?),
            None => provider,
        };

        let notifier = AlertNotifier::new(provider, self.config, failure);
        for listener in self.listeners {
            notifier.add_shared_listener(listener);
        }
        Ok(notifier)
    }

    /// Build the notifier and start listening immediately.
    pub fn listen(self) -> NotifierResult<(AlertNotifier, NotifierHandle)> {
        let notifier = self.build()?;
        let handle = notifier.listen()?;
        Ok((notifier, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Alert;
    use crate::error::ProviderError;

    struct Nothing;

    impl AlertProvider for Nothing {
        fn most_recent(&self) -> Result<Option<Alert>, ProviderError> {
            Ok(None)
        }

        fn since(&self, _marker: &Alert) -> Result<Vec<Alert>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn valid_builder() -> NotifierBuilder {
        NotifierBuilder::new()
            .provider(Nothing)
            .request_timeout(None)
            .on_failure(|_: &ProviderError| {})
            .on_alert(|_: &Alert| {})
    }

    fn config_error(builder: NotifierBuilder) -> ConfigError {
        match builder.build() {
            Err(NotifierError::Config(e)) => e,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_build() {
        let notifier = valid_builder().build().unwrap();
        assert_eq!(notifier.listener_count(), 1);
        assert_eq!(notifier.config().poll_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_missing_provider() {
        let builder = NotifierBuilder::new()
            .on_failure(|_: &ProviderError| {})
            .on_alert(|_: &Alert| {});
        assert_eq!(
            config_error(builder),
            ConfigError::MissingField {
                field: "provider".to_string()
            }
        );
    }

    #[test]
    fn test_missing_failure_handler() {
        let builder = NotifierBuilder::new().provider(Nothing).on_alert(|_: &Alert| {});
        assert_eq!(
            config_error(builder),
            ConfigError::MissingField {
                field: "failure_handler".to_string()
            }
        );
    }

    #[test]
    fn test_no_listeners() {
        let builder = NotifierBuilder::new()
            .provider(Nothing)
            .on_failure(|_: &ProviderError| {});
        assert_eq!(config_error(builder), ConfigError::NoListeners);
    }

    #[test]
    fn test_zero_delay() {
        let builder = valid_builder().poll_delay(Duration::ZERO);
        assert!(matches!(config_error(builder), ConfigError::InvalidDelay { .. }));
    }

    #[test]
    fn test_shared_listener_deduplicated() {
        let listener: Arc<dyn AlertListener> = Arc::new(|_: &Alert| {});
        let notifier = valid_builder()
            .on_alert_shared(Arc::clone(&listener))
            .on_alert_shared(listener)
            .build()
            .unwrap();
        assert_eq!(notifier.listener_count(), 2);
    }

    #[test]
    fn test_build_with_timeout_wraps_provider() {
        let notifier = valid_builder()
            .request_timeout(Some(Duration::from_millis(50)))
            .build()
            .unwrap();
        assert_eq!(notifier.config().request_timeout, Some(Duration::from_millis(50)));
    }
}
