//! Provider failure handlers.
//!
//! Every provider error, during bootstrap and steady-state polling alike, is
//! passed to the notifier's [`FailureHandler`]. Handlers are side-effecting
//! reporters (logging, metrics) and must not panic: a panic escapes onto the
//! poll thread and ends the loop.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::alert::Alert;
use crate::error::{ErrorCategory, ProviderError};

/// Receives provider failures.
pub trait FailureHandler: Send + Sync {
    /// Reports one failed provider request.
    fn handle(&self, error: &ProviderError);

    /// Called after each new alert has been delivered to the listeners.
    fn on_delivery(&self, _alert: &Alert) {}
}

impl<F> FailureHandler for F
where
    F: Fn(&ProviderError) + Send + Sync,
{
    fn handle(&self, error: &ProviderError) {
        self(error);
    }
}

/// Reports failures through `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingFailureHandler;

impl FailureHandler for LoggingFailureHandler {
    fn handle(&self, error: &ProviderError) {
        tracing::warn!(category = ?error.category(), %error, "alert provider request failed");
    }
}

/// Forwards at most `limit` failures per [`ErrorCategory`] to an inner handler.
///
/// Keeps a dead upstream from flooding the logs with the same error every
/// poll cycle. Counts are cleared whenever an alert is delivered, so the next
/// outage is reported again.
///
/// # Examples
///
/// ```
/// use redalert::{LimitedFailureHandler, LoggingFailureHandler};
///
/// let handler = LimitedFailureHandler::new(3, LoggingFailureHandler);
/// assert_eq!(handler.limit(), 3);
/// ```
#[derive(Debug)]
pub struct LimitedFailureHandler<H> {
    inner: H,
    limit: u32,
    handled: Mutex<HashMap<ErrorCategory, u32>>,
}

impl<H: FailureHandler> LimitedFailureHandler<H> {
    /// Wraps `inner`, allowing `limit` reports per category between deliveries.
    pub fn new(limit: u32, inner: H) -> Self {
        Self {
            inner,
            limit,
            handled: Mutex::new(HashMap::new()),
        }
    }

    /// Reports allowed per category.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// How many failures of `category` were forwarded since the last reset.
    #[must_use]
    pub fn handled(&self, category: ErrorCategory) -> u32 {
        self.handled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&category)
            .copied()
            .unwrap_or(0)
    }
}

impl<H: FailureHandler> FailureHandler for LimitedFailureHandler<H> {
    fn handle(&self, error: &ProviderError) {
        {
            let mut handled = self.handled.lock().unwrap_or_else(PoisonError::into_inner);
            let count = handled.entry(error.category()).or_insert(0);
            if *count >= self.limit {
                return;
            }
            *count += 1;
        }

        // Lock released before calling out.
        self.inner.handle(error);
    }

    fn on_delivery(&self, alert: &Alert) {
        self.handled.lock().unwrap_or_else(PoisonError::into_inner).clear();
        self.inner.on_delivery(alert);
    }
}
