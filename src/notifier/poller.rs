//! The poll-detect-notify loop.
//!
//! A `Poller` owns the cursor (the last alert it has seen) and is the only
//! writer of the notifier's history. Each cycle asks the provider for
//! everything after the cursor; a non-empty answer advances the cursor,
//! extends the history and is dispatched alert by alert, each alert reaching
//! every listener before the next one is dispatched.
//!
//! Provider errors never leave this module. They go to the failure handler
//! and the cycle counts as empty.

use std::sync::Arc;
use std::time::Duration;

use crate::alert::Alert;
use crate::error::ProviderError;
use crate::failure::FailureHandler;
use crate::history::AlertHistory;
use crate::listener::{notify_all, ListenerRegistry};
use crate::provider::AlertProvider;

use super::handle::CancellationToken;
use super::state::{NotifierState, StateCell};
use super::stats::NotifierStats;

/// Result of one bootstrap attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The cursor is now set to this alert.
    Ready(Alert),
    /// Upstream has no alert on record yet.
    Absent,
    /// The provider failed; the failure handler was invoked.
    Failed,
    /// A cursor was already established; nothing was queried.
    AlreadyBootstrapped,
}

/// Result of one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing new.
    Idle,
    /// `count` new alerts were recorded and dispatched.
    Delivered {
        /// Number of alerts in the batch.
        count: usize,
    },
    /// The provider failed; the failure handler was invoked.
    Failed,
    /// No cursor yet; call `bootstrap_once` first.
    NotBootstrapped,
}

/// Single-owner driver of the notifier loop.
///
/// Obtained from [`AlertNotifier::poller`](super::AlertNotifier::poller) for
/// manual stepping, or driven on a thread by
/// [`AlertNotifier::listen`](super::AlertNotifier::listen).
pub struct Poller {
    provider: Arc<dyn AlertProvider>,
    listeners: Arc<ListenerRegistry>,
    history: Arc<AlertHistory>,
    failure: Arc<dyn FailureHandler>,
    stats: Arc<NotifierStats>,
    state: Arc<StateCell>,
    cursor: Option<Alert>,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("cursor", &self.cursor)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

impl Poller {
    pub(crate) fn new(
        provider: Arc<dyn AlertProvider>,
        listeners: Arc<ListenerRegistry>,
        history: Arc<AlertHistory>,
        failure: Arc<dyn FailureHandler>,
        stats: Arc<NotifierStats>,
        state: Arc<StateCell>,
    ) -> Self {
        Self {
            provider,
            listeners,
            history,
            failure,
            stats,
            state,
            cursor: None,
        }
    }

    /// The last alert observed, if bootstrapped.
    #[must_use]
    pub const fn cursor(&self) -> Option<&Alert> {
        self.cursor.as_ref()
    }

    /// Queries the provider once for the baseline alert.
    ///
    /// The baseline becomes the cursor. It is not recorded in the history
    /// and is not delivered to listeners.
    pub fn bootstrap_once(&mut self) -> BootstrapOutcome {
        if self.cursor.is_some() {
            return BootstrapOutcome::AlreadyBootstrapped;
        }
        self.state.set(NotifierState::Bootstrapping);

        match self.provider.most_recent() {
            Ok(Some(alert)) => {
                tracing::info!(baseline = %alert, "alert notifier bootstrapped");
                self.cursor = Some(alert.clone());
                self.state.set(NotifierState::Polling);
                BootstrapOutcome::Ready(alert)
            }
            Ok(None) => {
                tracing::debug!("provider has no alert on record; bootstrap will retry");
                BootstrapOutcome::Absent
            }
            Err(error) => {
                self.report(&error);
                BootstrapOutcome::Failed
            }
        }
    }

    /// Runs one polling cycle without sleeping.
    pub fn poll_once(&mut self) -> CycleOutcome {
        let Some(cursor) = self.cursor.as_ref() else {
            return CycleOutcome::NotBootstrapped;
        };
        self.stats.record_cycle();

        let new_alerts = match self.provider.since(cursor) {
            Ok(alerts) => alerts,
            Err(error) => {
                self.report(&error);
                return CycleOutcome::Failed;
            }
        };

        let Some(last) = new_alerts.last() else {
            return CycleOutcome::Idle;
        };

        tracing::debug!(count = new_alerts.len(), cursor = %last, "advancing cursor");
        self.cursor = Some(last.clone());
        self.history.append(&new_alerts);
        self.deliver(&new_alerts);

        CycleOutcome::Delivered {
            count: new_alerts.len(),
        }
    }

    /// Bootstraps, then polls every `delay` until `token` is cancelled.
    pub fn run(mut self, delay: Duration, token: &CancellationToken) {
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "alert notifier starting"
        );

        if self.bootstrap(delay, token) {
            while token.wait(delay) {
                self.poll_once();
            }
        }

        self.state.set(NotifierState::Stopped);
        tracing::info!("alert notifier stopped");
    }

    fn bootstrap(&mut self, delay: Duration, token: &CancellationToken) -> bool {
        loop {
            if token.is_cancelled() {
                return false;
            }
            match self.bootstrap_once() {
                BootstrapOutcome::Ready(_) | BootstrapOutcome::AlreadyBootstrapped => return true,
                BootstrapOutcome::Absent | BootstrapOutcome::Failed => {
                    if !token.wait(delay) {
                        return false;
                    }
                }
            }
        }
    }

    fn report(&self, error: &ProviderError) {
        self.stats.record_failure();
        tracing::debug!(category = ?error.category(), %error, "provider request failed");
        self.failure.handle(error);
    }

    fn deliver(&self, alerts: &[Alert]) {
        let listeners = self.listeners.snapshot();
        for alert in alerts {
            tracing::info!(region = alert.region(), description = alert.description(), "new alert");
            let panicked = notify_all(&listeners, alert);
            self.stats.record_delivery(panicked);
            self.failure.on_delivery(alert);
        }
    }
}
