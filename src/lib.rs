//! # redalert - change-detection notifier for alert feeds
//!
//! redalert repeatedly asks an external provider for the latest occurrences
//! of an alert, works out which ones are new since the last observation,
//! records them in an ordered history and delivers each new alert exactly
//! once, in order, to every registered listener. Transient provider failures
//! are reported and retried; they never stop the loop.
//!
//! ## Core Concepts
//!
//! - **Alert**: one occurrence (region, description, timestamp), compared structurally
//! - **Provider**: the upstream, queried for "most recent" and "all since"
//! - **Cursor**: the last alert seen, lower bound of the next query
//! - **History**: append-only log of every alert discovered
//! - **Listener**: callback invoked once per new alert
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use redalert::{Alert, AlertNotifier, FeedProvider, LimitedFailureHandler, LoggingFailureHandler};
//!
//! let notifier = AlertNotifier::builder()
//!     .provider(FeedProvider::new(fetch_feed))
//!     .poll_delay(Duration::from_millis(500))
//!     .on_failure(LimitedFailureHandler::new(5, LoggingFailureHandler))
//!     .on_alert(|alert: &Alert| println!("{alert}"))
//!     .build()?;
//!
//! let handle = notifier.listen()?;
//! // ...
//! handle.shutdown()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alert;
pub mod error;
pub mod failure;
pub mod history;
pub mod listener;
pub mod notifier;
pub mod provider;

// Re-export primary types at crate root for convenience
pub use alert::Alert;
pub use error::{ConfigError, ErrorCategory, NotifierError, NotifierResult, ProviderError};
pub use failure::{FailureHandler, LimitedFailureHandler, LoggingFailureHandler};
pub use history::AlertHistory;
pub use listener::{AlertListener, ListenerId, ListenerRegistry};
pub use notifier::{
	AlertNotifier, BootstrapOutcome, CancellationToken, CycleOutcome, NotifierBuilder, NotifierConfig,
	NotifierHandle, NotifierState, Poller, StatsSnapshot,
};
pub use provider::{parse_feed, AlertProvider, FeedProvider, FeedSource, TimeoutProvider};
