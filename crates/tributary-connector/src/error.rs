//! Change Source error types
//!
//! Error definitions with transient/permanent classification so the sync
//! engine can decide between retrying a scope and skipping a single item.

use thiserror::Error;

/// Error that can occur while talking to an external change feed.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Connection errors (usually transient)
    /// Failed to establish connection to the external system.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection timed out.
    #[error("connection timeout after {timeout_secs} seconds")]
    ConnectionTimeout { timeout_secs: u64 },

    /// External system is temporarily unavailable.
    #[error("source unavailable: {message}")]
    SourceUnavailable { message: String },

    /// The external API throttled us.
    #[error("rate limited by source{}", .retry_after_secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    // Authentication errors (permanent)
    /// Invalid or revoked credentials.
    #[error("authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// Insufficient permissions for the operation.
    #[error("authorization failed: insufficient permissions for {operation}")]
    AuthorizationFailed { operation: String },

    // Configuration errors (permanent)
    /// Connector configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Item-level errors
    /// A single item in a page was malformed; the rest of the page is fine.
    #[error("invalid item '{external_id}': {message}")]
    InvalidItem {
        external_id: String,
        message: String,
    },

    /// The permission listing for an item could not be fetched.
    #[error("permission fetch failed for '{external_id}': {message}")]
    PermissionFetchFailed {
        external_id: String,
        message: String,
    },

    // Cursor errors
    /// The resume cursor was rejected by the source (expired delta link).
    #[error("invalid cursor: {message}")]
    InvalidCursor { message: String },

    /// Unclassified API error from the external system.
    #[error("api error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Api {
        status: Option<u16>,
        message: String,
    },
}

impl ConnectorError {
    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with a source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a source unavailable error.
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an invalid item error.
    pub fn invalid_item(external_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidItem {
            external_id: external_id.into(),
            message: message.into(),
        }
    }

    /// Create a permission fetch error.
    pub fn permission_fetch_failed(
        external_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::PermissionFetchFailed {
            external_id: external_id.into(),
            message: message.into(),
        }
    }

    /// Create an invalid cursor error.
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        Self::InvalidCursor {
            message: message.into(),
        }
    }

    /// Create an API error.
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is transient and worth retrying on a later run.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectorError::ConnectionFailed { .. }
                | ConnectorError::ConnectionTimeout { .. }
                | ConnectorError::SourceUnavailable { .. }
                | ConnectorError::RateLimited { .. }
        )
    }

    /// Check if this error is fatal for the whole connector (retrying with
    /// the same configuration cannot succeed).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConnectorError::AuthenticationFailed
                | ConnectorError::AuthorizationFailed { .. }
                | ConnectorError::InvalidConfiguration { .. }
        )
    }

    /// Check if this error affects a single item rather than the whole page.
    #[must_use]
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            ConnectorError::InvalidItem { .. } | ConnectorError::PermissionFetchFailed { .. }
        )
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
