//! Reconciliation errors.

use joinscope_core::{DeviceSource, SourceError};

/// Result type for reconciliation operations.
pub type ReconciliationResult<T> = Result<T, ReconciliationError>;

/// Errors that can occur during reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    /// Query issued before any pass completed.
    #[error("No device snapshot available: run refresh first")]
    NotRefreshed,

    /// A source adapter failed; the previous snapshot stays in place.
    #[error("Source fetch failed: {0}")]
    Source(#[from] SourceError),

    /// A record sits in a collection other than its origin.
    #[error("Record '{name}' from {origin} was supplied as part of the {collection} collection")]
    MisplacedRecord {
        name: String,
        origin: DeviceSource,
        collection: DeviceSource,
    },

    /// A source adapter was wired to the wrong collection.
    #[error("Adapter '{adapter}' provides {actual}, expected {expected}")]
    SourceMismatch {
        adapter: String,
        expected: DeviceSource,
        actual: DeviceSource,
    },

    /// Unknown collection or category name.
    #[error("Unknown {kind}: {value}")]
    UnknownName { kind: &'static str, value: String },
}

impl ReconciliationError {
    /// Check if retrying the refresh may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Source(e) => e.is_transient(),
            _ => false,
        }
    }
}
