//! Source adapter error types
//!
//! Error definitions with transient/permanent classification so callers can
//! decide whether a failed refresh is worth retrying.

use thiserror::Error;

use crate::types::DeviceSource;

/// Result type alias using `SourceError`.
pub type SourceResult<T> = Result<T, SourceError>;

/// Error raised while fetching a device inventory.
#[derive(Debug, Error)]
pub enum SourceError {
    // Connection errors (usually transient)
    /// Failed to establish connection to the backend.
    #[error("{source_kind}: connection failed: {message}")]
    ConnectionFailed {
        source_kind: DeviceSource,
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Backend is temporarily unavailable or throttling.
    #[error("{source_kind}: backend unavailable: {message}")]
    Unavailable {
        source_kind: DeviceSource,
        message: String,
    },

    // Authentication errors (permanent)
    /// Credentials were rejected.
    #[error("{source_kind}: authentication failed: {message}")]
    AuthenticationFailed {
        source_kind: DeviceSource,
        message: String,
    },

    /// Authenticated principal may not read devices.
    #[error("{source_kind}: permission denied: {message}")]
    PermissionDenied {
        source_kind: DeviceSource,
        message: String,
    },

    // Configuration errors (permanent)
    /// Adapter configuration is invalid.
    #[error("{source_kind}: invalid configuration: {message}")]
    InvalidConfiguration {
        source_kind: DeviceSource,
        message: String,
    },

    // Data errors
    /// Backend returned data that cannot be interpreted.
    #[error("{source_kind}: invalid data: {message}")]
    InvalidData {
        source_kind: DeviceSource,
        message: String,
    },

    /// Any other failure reported by the backend.
    #[error("{source_kind}: fetch failed: {message}")]
    FetchFailed {
        source_kind: DeviceSource,
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SourceError {
    /// Create a connection failed error.
    pub fn connection_failed(source_kind: DeviceSource, message: impl Into<String>) -> Self {
        SourceError::ConnectionFailed {
            source_kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Create a fetch failed error carrying the underlying cause.
    pub fn fetch_failed_with_source<E>(
        source_kind: DeviceSource,
        message: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SourceError::FetchFailed {
            source_kind,
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(source_kind: DeviceSource, message: impl Into<String>) -> Self {
        SourceError::InvalidConfiguration {
            source_kind,
            message: message.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(source_kind: DeviceSource, message: impl Into<String>) -> Self {
        SourceError::InvalidData {
            source_kind,
            message: message.into(),
        }
    }

    /// Which inventory failed.
    pub fn source_kind(&self) -> DeviceSource {
        match self {
            SourceError::ConnectionFailed { source_kind, .. }
            | SourceError::Unavailable { source_kind, .. }
            | SourceError::AuthenticationFailed { source_kind, .. }
            | SourceError::PermissionDenied { source_kind, .. }
            | SourceError::InvalidConfiguration { source_kind, .. }
            | SourceError::InvalidData { source_kind, .. }
            | SourceError::FetchFailed { source_kind, .. } => *source_kind,
        }
    }

    /// Check if retrying the fetch may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::ConnectionFailed { .. } | SourceError::Unavailable { .. }
        )
    }
}
