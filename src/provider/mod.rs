//! Alert provider contract.
//!
//! The notifier consumes an upstream source of alerts only through the two
//! queries of [`AlertProvider`]. Concrete transports (HTTP clients, proxies)
//! live outside this crate; [`feed::FeedProvider`] adapts any source that
//! serves the whole history document, and [`timeout::TimeoutProvider`]
//! bounds each call.

use std::sync::Arc;

use crate::alert::Alert;
use crate::error::ProviderError;

/// Feed-document adapter.
pub mod feed;
/// Per-call deadline decorator.
pub mod timeout;

pub use feed::{parse_feed, FeedProvider, FeedSource};
pub use timeout::TimeoutProvider;

/// Source of alerts queried by the notifier.
///
/// Both queries are pure from the caller's perspective and may be repeated
/// freely. Any error is treated as transient.
pub trait AlertProvider: Send + Sync {
    /// Returns the latest known alert, or `None` when upstream has none on record.
    fn most_recent(&self) -> Result<Option<Alert>, ProviderError>;

    /// Returns every alert that occurred strictly after `marker`, oldest first.
    ///
    /// An empty vector means nothing new; implementations should return
    /// `Vec::new()` in that case so the idle path never allocates.
    fn since(&self, marker: &Alert) -> Result<Vec<Alert>, ProviderError>;
}

impl<P: AlertProvider + ?Sized> AlertProvider for Arc<P> {
    fn most_recent(&self) -> Result<Option<Alert>, ProviderError> {
        (**self).most_recent()
    }

    fn since(&self, marker: &Alert) -> Result<Vec<Alert>, ProviderError> {
        (**self).since(marker)
    }
}

impl<P: AlertProvider + ?Sized> AlertProvider for Box<P> {
    fn most_recent(&self) -> Result<Option<Alert>, ProviderError> {
        (**self).most_recent()
    }

    fn since(&self, marker: &Alert) -> Result<Vec<Alert>, ProviderError> {
        (**self).since(marker)
    }
}
