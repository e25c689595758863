//! Notifier counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by the poll loop.
#[derive(Debug, Default)]
pub struct NotifierStats {
    cycles: AtomicU64,
    provider_failures: AtomicU64,
    alerts_delivered: AtomicU64,
    listener_panics: AtomicU64,
}

/// Point-in-time copy of [`NotifierStats`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub provider_failures: u64,
    pub alerts_delivered: u64,
    pub listener_panics: u64,
}

impl NotifierStats {
    pub(crate) fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self, listener_panics: u64) {
        self.alerts_delivered.fetch_add(1, Ordering::Relaxed);
        if listener_panics > 0 {
            self.listener_panics.fetch_add(listener_panics, Ordering::Relaxed);
        }
    }

    /// Reads all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
            alerts_delivered: self.alerts_delivered.load(Ordering::Relaxed),
            listener_panics: self.listener_panics.load(Ordering::Relaxed),
        }
    }
}
