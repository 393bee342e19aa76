//! Error types for the directory adapter.

use joinscope_core::{DeviceSource, SourceError};
use thiserror::Error;

/// Result type alias using `AdError`.
pub type AdResult<T> = Result<T, AdError>;

/// LDAP result code for invalid credentials.
const LDAP_INVALID_CREDENTIALS: u32 = 49;
/// LDAP result code for insufficient access rights.
const LDAP_INSUFFICIENT_ACCESS: u32 = 50;
/// LDAP result codes for busy/unavailable servers.
const LDAP_BUSY: u32 = 51;
const LDAP_UNAVAILABLE: u32 = 52;

/// Errors that can occur when reading computers from Active Directory.
#[derive(Debug, Error)]
pub enum AdError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Could not reach the domain controller.
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// The server rejected the bind or a search.
    #[error("LDAP operation '{operation}' failed with code {rc}: {text}")]
    Operation {
        operation: &'static str,
        rc: u32,
        text: String,
    },

    /// Protocol or transport failure during an operation.
    #[error("LDAP error: {0}")]
    Ldap(#[from] ldap3::LdapError),

    /// The search base exists but returned nothing at all.
    #[error("Base DN '{0}' not found or not accessible")]
    BaseNotFound(String),
}

impl AdError {
    /// Build an error from a non-success LDAP result.
    pub fn from_result(operation: &'static str, result: &ldap3::LdapResult) -> Self {
        AdError::Operation {
            operation,
            rc: result.rc,
            text: result.text.clone(),
        }
    }
}

impl From<AdError> for SourceError {
    fn from(err: AdError) -> Self {
        let source_kind = DeviceSource::Directory;
        match err {
            AdError::Config(message) => SourceError::InvalidConfiguration {
                source_kind,
                message,
            },
            AdError::Connect { url, source } => SourceError::ConnectionFailed {
                source_kind,
                message: format!("cannot reach {url}"),
                cause: Some(Box::new(source)),
            },
            AdError::Operation { rc, .. } if rc == LDAP_INVALID_CREDENTIALS => {
                SourceError::AuthenticationFailed {
                    source_kind,
                    message: err.to_string(),
                }
            }
            AdError::Operation { rc, .. } if rc == LDAP_INSUFFICIENT_ACCESS => {
                SourceError::PermissionDenied {
                    source_kind,
                    message: err.to_string(),
                }
            }
            AdError::Operation { rc, .. } if rc == LDAP_BUSY || rc == LDAP_UNAVAILABLE => {
                SourceError::Unavailable {
                    source_kind,
                    message: err.to_string(),
                }
            }
            AdError::Operation { .. } | AdError::BaseNotFound(_) => SourceError::FetchFailed {
                source_kind,
                message: err.to_string(),
                cause: None,
            },
            AdError::Ldap(source) => SourceError::fetch_failed_with_source(
                source_kind,
                "LDAP protocol error",
                source,
            ),
        }
    }
}
