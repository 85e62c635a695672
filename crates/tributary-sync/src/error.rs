//! Sync engine error types.

use thiserror::Error;
use tributary_connector::ConnectorError;

/// Errors that can occur during a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Change Source error.
    #[error("source error: {0}")]
    Source(#[from] ConnectorError),

    /// Record store (Persistence) error.
    #[error("store error: {message}")]
    Store { message: String },

    /// Downstream sink rejected a dispatch.
    #[error("sink error: {message}")]
    Sink { message: String },

    /// Sync point could not be read or written.
    #[error("sync point error: {message}")]
    SyncPoint { message: String },

    /// Sync is disabled by configuration.
    #[error("sync is disabled for scope {scope_key}")]
    Disabled { scope_key: String },

    /// The scope's run was cancelled between pages.
    #[error("sync cancelled for scope {scope_key}")]
    Cancelled { scope_key: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl SyncError {
    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a sink error.
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Create a sync point error.
    pub fn sync_point(message: impl Into<String>) -> Self {
        Self::SyncPoint {
            message: message.into(),
        }
    }

    /// Create a disabled error.
    pub fn disabled(scope_key: impl Into<String>) -> Self {
        Self::Disabled {
            scope_key: scope_key.into(),
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(scope_key: impl Into<String>) -> Self {
        Self::Cancelled {
            scope_key: scope_key.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Fatal errors propagate immediately; retrying with the same
    /// configuration cannot succeed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Source(e) => e.is_fatal(),
            SyncError::Configuration { .. } | SyncError::Disabled { .. } => true,
            _ => false,
        }
    }

    /// Item-level errors skip one item and continue with the page.
    #[must_use]
    pub fn is_item_level(&self) -> bool {
        matches!(self, SyncError::Source(e) if e.is_item_level())
    }

    /// Scope-level errors abort the current scope's loop, leaving the last
    /// stored cursor intact; the scope is retried on the next scheduled run.
    #[must_use]
    pub fn is_scope_level(&self) -> bool {
        !self.is_fatal() && !self.is_item_level()
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::sink("queue full");
        assert!(err.to_string().contains("queue full"));

        let err = SyncError::disabled("c1:drive:u1");
        assert!(err.to_string().contains("c1:drive:u1"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(SyncError::Source(ConnectorError::AuthenticationFailed).is_fatal());
        assert!(SyncError::configuration("bad batch size").is_fatal());
        assert!(!SyncError::sink("flaky").is_fatal());
        assert!(!SyncError::Source(ConnectorError::source_unavailable("503")).is_fatal());
    }

    #[test]
    fn test_item_level_classification() {
        let err = SyncError::Source(ConnectorError::invalid_item("x", "no path"));
        assert!(err.is_item_level());
        assert!(!err.is_scope_level());

        let err = SyncError::sink("boom");
        assert!(!err.is_item_level());
        assert!(err.is_scope_level());
    }
}
