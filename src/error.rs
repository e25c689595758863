//! Error types for redalert.
//!
//! All errors are strongly typed using thiserror. Provider failures are
//! transient by contract and never stop the poll loop; configuration errors
//! are fatal and only ever raised at build time.

use thiserror::Error;

/// Discriminant of a [`ProviderError`], used as a rate-limiting key.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Connection,
    Malformed,
    Timeout,
    Disconnected,
    Other,
}

/// Failures raised by an alert provider.
///
/// Every variant is treated as transient by the notifier: it is reported to
/// the failure handler and the request is retried after the poll delay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Connection failed: {message}")]
    Connection {
        message: String,
    },

    #[error("Malformed response: {message}")]
    Malformed {
        message: String,
    },

    #[error("Provider request timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Channel disconnected: {path}")]
    Disconnected {
        path: String,
    },

    #[error("Provider error: {message}")]
    Other {
        message: String,
    },
}

impl ProviderError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a malformed-response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a catch-all provider error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Malformed { .. } => ErrorCategory::Malformed,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Disconnected { .. } => ErrorCategory::Disconnected,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

/// Construction-time configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("At least one alert listener must be registered")]
    NoListeners,

    #[error("Invalid poll delay: {reason}")]
    InvalidDelay {
        reason: String,
    },
}

/// Top-level error type for redalert.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Notifier is already listening")]
    AlreadyListening,

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl NotifierError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is a provider error.
    #[must_use]
    pub const fn is_provider(&self) -> bool {
        matches!(self, Self::Provider(_))
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

/// Result type alias for notifier operations.
pub type NotifierResult<T> = Result<T, NotifierError>;
