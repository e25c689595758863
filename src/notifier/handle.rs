//! Cancellation and the running-loop handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::error::{NotifierError, NotifierResult};

#[derive(Debug)]
struct CancelInner {
    cancelled: AtomicBool,
    // Dropping the sender disconnects `rx`, waking every waiter at once.
    guard: Mutex<Option<Sender<()>>>,
    rx: Receiver<()>,
}

/// Cooperative stop signal for a poll loop.
///
/// Clones share the same signal. Cancelling wakes a loop that is sleeping
/// between requests immediately; a provider call already in flight is
/// allowed to finish (bound it with a request timeout).
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<CancelInner>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = bounded::<()>(1);
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                guard: Mutex::new(Some(tx)),
                rx,
            }),
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        drop(self.inner.guard.lock().unwrap_or_else(PoisonError::into_inner).take());
    }

    /// Returns true once `cancel` has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Sleeps for `timeout` unless cancelled first.
    ///
    /// Returns true if the full timeout elapsed without cancellation.
    #[must_use]
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        match self.inner.rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Disconnected) => false,
            Ok(()) | Err(RecvTimeoutError::Timeout) => !self.is_cancelled(),
        }
    }
}

/// Handle to a notifier loop running on its own thread.
///
/// Dropping the handle detaches the loop, which keeps running until its
/// token is cancelled or the process exits.
#[derive(Debug)]
pub struct NotifierHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl NotifierHandle {
    pub(crate) fn new(token: CancellationToken, join: JoinHandle<()>) -> Self {
        Self { token, join }
    }

    /// Asks the loop to stop at its next check.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A clone of the loop's cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Returns true once the loop thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Blocks until the loop exits.
    ///
    /// Without a prior `cancel` this waits for as long as the loop runs,
    /// which is forever unless something else cancels the token.
    pub fn join(self) -> NotifierResult<()> {
        self.join
            .join()
            .map_err(|_| NotifierError::internal("notifier thread panicked"))
    }

    /// Cancels the loop and waits for it to exit.
    pub fn shutdown(self) -> NotifierResult<()> {
        self.cancel();
        self.join()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Instant;

    use super::*;

    #[test]
    fn test_wait_elapses_without_cancel() {
        let token = CancellationToken::new();
        assert!(token.wait(Duration::from_millis(5)));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_shared_by_clones() {
        let token = CancellationToken::new();
        let other = token.clone();
        other.cancel();
        other.cancel();
        assert!(token.is_cancelled());
        assert!(!token.wait(Duration::from_secs(5)));
    }

    #[test]
    fn test_cancel_wakes_sleeper() {
        let token = CancellationToken::new();
        let sleeper = token.clone();
        let started = Instant::now();
        let join = thread::spawn(move || sleeper.wait(Duration::from_secs(30)));

        thread::sleep(Duration::from_millis(20));
        token.cancel();

        assert!(!join.join().unwrap());
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
