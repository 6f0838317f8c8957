//! Error types for the McpCatalog operator

use thiserror::Error;

/// Main error type for catalog operations
///
/// Validation failures are not represented here: an invalid catalog is
/// recorded in status and the reconcile still succeeds.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// The stored object changed since it was fetched
    #[error("conflict writing {key}: {message}")]
    Conflict {
        /// Key of the object being written
        key: String,
        /// Description from the API server
        message: String,
    },

    /// A store operation did not complete in time
    #[error("timed out during {operation} after {seconds}s")]
    Timeout {
        /// Operation that was abandoned (e.g. "get", "update_status")
        operation: String,
        /// Configured timeout in seconds
        seconds: u64,
    },

    /// The object key could not be interpreted
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Where the error occurred (e.g. "startup", "poll_until")
        context: String,
    },
}

impl Error {
    /// Create a conflict error for the given key
    pub fn conflict(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Conflict {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Create a timeout error for the given operation
    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// Create an invalid key error with the given message
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Store I/O failures (connectivity, conflicts, timeouts, throttling and
    /// server errors) may succeed on a later cycle. API responses in the 4xx
    /// range other than 404, 409 and 429 reject the request itself and will
    /// fail the same way again, as will key and serialization errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Kube(kube::Error::Api(ae)) => !is_permanent_rejection(ae.code),
            Self::Kube(_) | Self::Conflict { .. } | Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Check if this error is an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

fn is_permanent_rejection(code: u16) -> bool {
    (400..500).contains(&code) && !matches!(code, 404 | 409 | 429)
}
