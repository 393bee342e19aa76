//! Versioned snapshot storage.
//!
//! The store starts [`SnapshotState::Unpopulated`]. Each refresh swaps in a
//! complete new [`Snapshot`]; readers keep whatever `Arc` they already hold.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use joinscope_core::{DeviceRecord, DeviceSource};
use serde::{Deserialize, Serialize};

use crate::config::NameMatching;
use crate::error::{ReconciliationError, ReconciliationResult};
use crate::statistics::RunStatistics;

/// Annotated collections and broken subset produced by one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Store version, starting at 1 for the first pass.
    pub version: u64,
    /// When the collections were captured.
    pub captured_at: DateTime<Utc>,
    /// Name rules the pass used; lookups reuse them.
    #[serde(default)]
    pub name_matching: NameMatching,
    pub directory: Vec<DeviceRecord>,
    pub identity: Vec<DeviceRecord>,
    pub device_management: Vec<DeviceRecord>,
    /// Identity records with no managed same-named sibling.
    pub broken: Vec<DeviceRecord>,
    #[serde(default)]
    pub statistics: RunStatistics,
}

impl Snapshot {
    /// Records of one source collection.
    pub fn records(&self, source: DeviceSource) -> &[DeviceRecord] {
        match source {
            DeviceSource::Directory => &self.directory,
            DeviceSource::IdentityService => &self.identity,
            DeviceSource::DeviceManagement => &self.device_management,
        }
    }

    /// Time elapsed since capture.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.captured_at
    }
}

/// State of the snapshot store.
#[derive(Debug, Clone, Default)]
pub enum SnapshotState {
    /// No pass has completed yet.
    #[default]
    Unpopulated,
    /// The latest completed pass.
    Populated(Arc<Snapshot>),
}

impl SnapshotState {
    #[must_use]
    pub fn is_populated(&self) -> bool {
        matches!(self, Self::Populated(_))
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    state: SnapshotState,
    version: u64,
}

/// Process-wide holder of the current snapshot.
///
/// Cloning the store shares the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl SnapshotStore {
    /// Create an unpopulated store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot, assigning it the next version.
    pub fn replace(&self, mut snapshot: Snapshot) -> Arc<Snapshot> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.version += 1;
        snapshot.version = inner.version;
        let snapshot = Arc::new(snapshot);
        inner.state = SnapshotState::Populated(Arc::clone(&snapshot));
        snapshot
    }

    /// Install a previously persisted snapshot, keeping its version.
    pub fn restore(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.version = inner.version.max(snapshot.version);
        let snapshot = Arc::new(snapshot);
        inner.state = SnapshotState::Populated(Arc::clone(&snapshot));
        snapshot
    }

    /// Current state, including the unpopulated sentinel.
    pub fn state(&self) -> SnapshotState {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .state
            .clone()
    }

    /// Current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ReconciliationError::NotRefreshed`] before the first pass.
    pub fn current(&self) -> ReconciliationResult<Arc<Snapshot>> {
        match self.state() {
            SnapshotState::Populated(snapshot) => Ok(snapshot),
            SnapshotState::Unpopulated => Err(ReconciliationError::NotRefreshed),
        }
    }

    /// Number of completed replacements (0 while unpopulated).
    pub fn version(&self) -> u64 {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).version
    }

    /// Capture time of the current snapshot.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        match self.state() {
            SnapshotState::Populated(snapshot) => Some(snapshot.captured_at),
            SnapshotState::Unpopulated => None,
        }
    }
}
