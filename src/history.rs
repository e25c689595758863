//! Append-only record of discovered alerts.
//!
//! Entries are kept in discovery order, which within one batch is the
//! provider's chronological order. Nothing is ever removed or reordered, and
//! structurally identical alerts are not collapsed: if upstream reports the
//! same values twice, both are kept.

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use crate::alert::Alert;

/// Alerts captured by a notifier since it started listening.
///
/// Shared between the poll loop (the only writer) and any number of
/// readers; every read returns owned data so no lock outlives the call.
#[derive(Debug, Default)]
pub struct AlertHistory {
    entries: RwLock<Vec<Alert>>,
}

impl AlertHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, alerts: &[Alert]) {
        if alerts.is_empty() {
            return;
        }
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(alerts);
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Alert>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// The last alert appended, if any.
    #[must_use]
    pub fn most_recent(&self) -> Option<Alert> {
        self.read().last().cloned()
    }

    /// Alerts whose region contains `region`, in history order.
    ///
    /// Matching is a case-sensitive substring test, so "Tel" matches both
    /// "Tel Aviv" and "Tel Mond".
    #[must_use]
    pub fn matching_region(&self, region: &str) -> Vec<Alert> {
        self.read()
            .iter()
            .filter(|alert| alert.region().contains(region))
            .cloned()
            .collect()
    }

    /// A copy of the whole history.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Alert> {
        self.read().clone()
    }

    /// Number of recorded alerts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
