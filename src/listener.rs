//! Listener registry.
//!
//! Listeners are invoked synchronously on the poll thread, once per new
//! alert. The registry may be modified from any thread while the loop runs;
//! each batch is dispatched against a snapshot taken when the batch starts.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alert::Alert;

/// Callback invoked for each newly discovered alert.
///
/// A listener that panics is isolated: the panic is logged and counted and
/// the remaining listeners still receive the alert.
pub trait AlertListener: Send + Sync {
    /// Handles one new alert.
    fn on_alert(&self, alert: &Alert);
}

impl<F> AlertListener for F
where
    F: Fn(&Alert) + Send + Sync,
{
    fn on_alert(&self, alert: &Alert) {
        self(alert);
    }
}

/// Unique identifier for a registered listener.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new random listener id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

struct Entry {
    id: ListenerId,
    listener: Arc<dyn AlertListener>,
}

/// Set of listeners, deduplicated by `Arc` identity.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: RwLock<Vec<Entry>>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

fn same_listener(a: &Arc<dyn AlertListener>, b: &Arc<dyn AlertListener>) -> bool {
    // Compare data pointers only; vtable pointers are not stable across codegen units.
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    ///
    /// Registering an `Arc` that is already present has no effect and returns
    /// the id it was first registered under.
    pub fn register(&self, listener: Arc<dyn AlertListener>) -> ListenerId {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.iter().find(|e| same_listener(&e.listener, &listener)) {
            return existing.id;
        }

        let id = ListenerId::new();
        entries.push(Entry { id, listener });
        id
    }

    /// Removes a listener. Returns false if the id is unknown.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn AlertListener>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| Arc::clone(&e.listener))
            .collect()
    }
}

/// Invokes every listener with `alert`, in registration order.
///
/// Returns how many listeners panicked.
pub(crate) fn notify_all(listeners: &[Arc<dyn AlertListener>], alert: &Alert) -> u64 {
    let mut panicked = 0;
    for listener in listeners {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener.on_alert(alert))) {
            panicked += 1;
            tracing::error!(
                region = alert.region(),
                panic = panic_message(payload.as_ref()),
                "alert listener panicked"
            );
        }
    }
    panicked
}

fn panic_message<'a>(payload: &'a (dyn std::any::Any + Send + 'static)) -> &'a str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
