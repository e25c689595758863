//! Provider over a "whole history" feed document.
//!
//! The upstream serves a JSON array of alerts, newest first. Each query
//! fetches the full document and derives the answer from it:
//! - `most_recent` is the head of the array.
//! - `since(marker)` is everything ahead of the first entry equal to
//!   `marker`, reversed into chronological order.

use crate::alert::Alert;
use crate::error::ProviderError;

use super::AlertProvider;

/// Fetches the raw feed body.
pub trait FeedSource: Send + Sync {
    /// Returns the current feed document.
    fn fetch(&self) -> Result<String, ProviderError>;
}

impl<F> FeedSource for F
where
    F: Fn() -> Result<String, ProviderError> + Send + Sync,
{
    fn fetch(&self) -> Result<String, ProviderError> {
        self()
    }
}

/// Parses a feed body into alerts, preserving feed order (newest first).
///
/// A blank body is an empty feed: the upstream answers with an empty
/// document rather than `[]` when it has nothing on record.
pub fn parse_feed(body: &str) -> Result<Vec<Alert>, ProviderError> {
    // Some upstreams prefix the document with a UTF-8 BOM.
    let body = body.trim_start_matches('\u{feff}').trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(body)
        .map_err(|e| ProviderError::malformed(format!("invalid alert feed: {e}")))
}

/// [`AlertProvider`] backed by a [`FeedSource`].
#[derive(Debug)]
pub struct FeedProvider<S> {
    source: S,
}

impl<S: FeedSource> FeedProvider<S> {
    /// Wraps a feed source.
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    fn load(&self) -> Result<Vec<Alert>, ProviderError> {
        parse_feed(&self.source.fetch()?)
    }
}

impl<S: FeedSource> AlertProvider for FeedProvider<S> {
    fn most_recent(&self) -> Result<Option<Alert>, ProviderError> {
        Ok(self.load()?.into_iter().next())
    }

    fn since(&self, marker: &Alert) -> Result<Vec<Alert>, ProviderError> {
        let mut feed = self.load()?;

        // If the marker rolled off the feed, everything on it is new.
        if let Some(pos) = feed.iter().position(|alert| alert == marker) {
            feed.truncate(pos);
        }

        feed.reverse();
        Ok(feed)
    }
}
