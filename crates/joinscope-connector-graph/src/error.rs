//! Error types for the Graph adapters.

use joinscope_core::{DeviceSource, SourceError};
use thiserror::Error;

/// Result type alias using `GraphError`.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur when reading devices through Microsoft Graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// `OAuth2` authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Microsoft Graph API error.
    #[error("Graph API error ({status}): {code} - {message}")]
    GraphApi {
        status: u16,
        code: String,
        message: String,
    },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Throttling or transient failures outlasted the retry budget.
    #[error("Maximum retries ({attempts}) exceeded, last status {status}")]
    MaxRetriesExceeded { attempts: u32, status: u16 },
}

impl GraphError {
    /// Whether retrying the whole fetch later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::MaxRetriesExceeded { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::GraphApi { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Classify for the reconciliation engine.
    pub fn into_source_error(self, source_kind: DeviceSource) -> SourceError {
        match self {
            GraphError::Config(message) => SourceError::InvalidConfiguration {
                source_kind,
                message,
            },
            GraphError::Auth(message) => SourceError::AuthenticationFailed {
                source_kind,
                message,
            },
            GraphError::GraphApi { status: 401, .. } => SourceError::AuthenticationFailed {
                source_kind,
                message: self.to_string(),
            },
            GraphError::GraphApi { status: 403, .. } => SourceError::PermissionDenied {
                source_kind,
                message: self.to_string(),
            },
            GraphError::MaxRetriesExceeded { .. } => SourceError::Unavailable {
                source_kind,
                message: self.to_string(),
            },
            GraphError::Http(e) if e.is_timeout() || e.is_connect() => {
                SourceError::ConnectionFailed {
                    source_kind,
                    message: "cannot reach Microsoft Graph".to_string(),
                    cause: Some(Box::new(e)),
                }
            }
            GraphError::Http(e) => {
                SourceError::fetch_failed_with_source(source_kind, "HTTP request failed", e)
            }
            GraphError::Json(e) => SourceError::InvalidData {
                source_kind,
                message: format!("unexpected response body: {e}"),
            },
            GraphError::Url(e) => SourceError::InvalidConfiguration {
                source_kind,
                message: e.to_string(),
            },
            GraphError::GraphApi { .. } => SourceError::FetchFailed {
                source_kind,
                message: self.to_string(),
                cause: None,
            },
        }
    }
}
