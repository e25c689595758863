//! Lifecycle state of a notifier.

use std::sync::atomic::{AtomicU8, Ordering};

/// Where the poll loop is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NotifierState {
    /// `listen`/`poller` has not been called.
    Unstarted = 0,
    /// Waiting for the first successful most-recent query.
    Bootstrapping = 1,
    /// Cursor established; polling for new alerts.
    Polling = 2,
    /// The loop observed cancellation and exited.
    Stopped = 3,
}

#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl Default for StateCell {
    fn default() -> Self {
        Self(AtomicU8::new(NotifierState::Unstarted as u8))
    }
}

impl StateCell {
    pub(crate) fn get(&self) -> NotifierState {
        match self.0.load(Ordering::Acquire) {
            0 => NotifierState::Unstarted,
            1 => NotifierState::Bootstrapping,
            2 => NotifierState::Polling,
            _ => NotifierState::Stopped,
        }
    }

    pub(crate) fn set(&self, state: NotifierState) {
        self.0.store(state as u8, Ordering::Release);
    }
}
