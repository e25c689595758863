//! Alert notifier.
//!
//! Polls an [`AlertProvider`] for alerts newer than the last one seen and
//! delivers each new alert, in order and exactly once, to every registered
//! listener. Provider failures are reported and retried forever; the loop
//! only ends through its [`CancellationToken`].

mod builder;
mod config;
mod handle;
mod poller;
mod state;
mod stats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{NotifierError, NotifierResult};
use crate::failure::FailureHandler;
use crate::history::AlertHistory;
use crate::listener::{AlertListener, ListenerId, ListenerRegistry};
use crate::provider::AlertProvider;

pub use builder::NotifierBuilder;
pub use config::{NotifierConfig, DEFAULT_POLL_DELAY, DEFAULT_REQUEST_TIMEOUT};
pub use handle::{CancellationToken, NotifierHandle};
pub use poller::{BootstrapOutcome, CycleOutcome, Poller};
pub use state::NotifierState;
pub use stats::{NotifierStats, StatsSnapshot};

use state::StateCell;

/// Notifies registered listeners as soon as the provider reports a new alert.
///
/// A notifier runs at most once: either on its own thread via
/// [`listen`](Self::listen) or stepped manually through
/// [`poller`](Self::poller).
pub struct AlertNotifier {
    provider: Arc<dyn AlertProvider>,
    config: NotifierConfig,
    failure: Arc<dyn FailureHandler>,
    listeners: Arc<ListenerRegistry>,
    history: Arc<AlertHistory>,
    stats: Arc<NotifierStats>,
    state: Arc<StateCell>,
    started: AtomicBool,
}

impl std::fmt::Debug for AlertNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertNotifier")
            .field("config", &self.config)
            .field("listeners", &self.listeners)
            .field("history_len", &self.history.len())
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

impl AlertNotifier {
    pub(crate) fn new(
        provider: Arc<dyn AlertProvider>,
        config: NotifierConfig,
        failure: Arc<dyn FailureHandler>,
    ) -> Self {
        Self {
            provider,
            config,
            failure,
            listeners: Arc::new(ListenerRegistry::new()),
            history: Arc::new(AlertHistory::new()),
            stats: Arc::new(NotifierStats::default()),
            state: Arc::new(StateCell::default()),
            started: AtomicBool::new(false),
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> NotifierBuilder {
        NotifierBuilder::new()
    }

    /// The configuration this notifier was built with.
    #[must_use]
    pub const fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Registers another listener. Takes effect from the next dispatched batch.
    pub fn add_listener<L: AlertListener + 'static>(&self, listener: L) -> ListenerId {
        self.listeners.register(Arc::new(listener))
    }

    /// Registers a shared listener; the same `Arc` is only registered once.
    pub fn add_shared_listener(&self, listener: Arc<dyn AlertListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    /// Removes a listener. Returns false if the id is unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.unregister(id)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// The alerts captured since the notifier started.
    #[must_use]
    pub fn history(&self) -> Arc<AlertHistory> {
        Arc::clone(&self.history)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> NotifierState {
        self.state.get()
    }

    /// Counters maintained by the loop.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Takes the loop body for manual stepping.
    ///
    /// Fails with `AlreadyListening` if `listen` or `poller` was called before.
    pub fn poller(&self) -> NotifierResult<Poller> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(NotifierError::AlreadyListening);
        }

        Ok(Poller::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.listeners),
            Arc::clone(&self.history),
            Arc::clone(&self.failure),
            Arc::clone(&self.stats),
            Arc::clone(&self.state),
        ))
    }

    /// Starts the poll loop on a dedicated thread.
    ///
    /// The returned handle can be joined, cancelled, or dropped to let the
    /// loop run for the rest of the process.
    pub fn listen(&self) -> NotifierResult<NotifierHandle> {
        let name = self.config.thread_name.clone();
        self.start_with(|body| thread::Builder::new().name(name).spawn(body))
    }

    /// Runs the loop body through `spawn`. A failed spawn frees the start slot.
    fn start_with<S>(&self, spawn: S) -> NotifierResult<NotifierHandle>
    where
        S: FnOnce(Box<dyn FnOnce() + Send>) -> io::Result<JoinHandle<()>>,
    {
        let poller = self.poller()?;
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let delay = self.config.poll_delay;

        match spawn(Box::new(move || poller.run(delay, &loop_token))) {
            Ok(join) => Ok(NotifierHandle::new(token, join)),
            Err(e) => {
                self.started.store(false, Ordering::Release);
                Err(NotifierError::internal(format!("failed to spawn notifier thread: {e}")))
            }
        }
    }
}
