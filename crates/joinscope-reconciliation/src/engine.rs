//! Reconciliation engine.
//!
//! Runs annotation, cross-referencing and duplicate resolution over one set of
//! collections and publishes the result to the snapshot store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use joinscope_core::{DeviceInventorySource, DeviceRecord, DeviceSource};

use crate::annotator::{Annotator, DeviceCollections};
use crate::config::ReconciliationConfig;
use crate::cross_reference::{CrossReferencer, Participation};
use crate::duplicates::DuplicateResolver;
use crate::error::{ReconciliationError, ReconciliationResult};
use crate::query::SnapshotView;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::statistics::{RunStatistics, StatisticsTracker};

/// Result of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconciliationOutcome {
    /// The published snapshot.
    pub snapshot: Arc<Snapshot>,
    /// Statistics for the pass.
    pub statistics: RunStatistics,
}

/// The three adapters a refresh fetches from.
pub struct InventorySources {
    pub directory: Box<dyn DeviceInventorySource>,
    pub identity: Box<dyn DeviceInventorySource>,
    pub device_management: Box<dyn DeviceInventorySource>,
}

impl InventorySources {
    pub fn new(
        directory: Box<dyn DeviceInventorySource>,
        identity: Box<dyn DeviceInventorySource>,
        device_management: Box<dyn DeviceInventorySource>,
    ) -> Self {
        Self {
            directory,
            identity,
            device_management,
        }
    }

    /// Adapters paired with the collection they must fill.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceSource, &dyn DeviceInventorySource)> {
        [
            (DeviceSource::Directory, self.directory.as_ref()),
            (DeviceSource::IdentityService, self.identity.as_ref()),
            (DeviceSource::DeviceManagement, self.device_management.as_ref()),
        ]
        .into_iter()
    }

    fn check_wiring(&self) -> ReconciliationResult<()> {
        for (expected, adapter) in self.iter() {
            if adapter.source() != expected {
                return Err(ReconciliationError::SourceMismatch {
                    adapter: adapter.display_name().to_string(),
                    expected,
                    actual: adapter.source(),
                });
            }
        }
        Ok(())
    }
}

/// Reconciliation engine.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    config: ReconciliationConfig,
    store: SnapshotStore,
}

impl ReconciliationEngine {
    /// Create an engine with a fresh, unpopulated store.
    pub fn new(config: ReconciliationConfig) -> Self {
        Self::with_store(config, SnapshotStore::new())
    }

    /// Create an engine publishing to an existing store.
    pub fn with_store(config: ReconciliationConfig, store: SnapshotStore) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Reconcile collections captured now.
    ///
    /// # Errors
    ///
    /// Returns [`ReconciliationError::MisplacedRecord`] if a record sits in a
    /// collection other than its origin. The store is left untouched.
    pub fn reconcile(
        &self,
        collections: DeviceCollections,
    ) -> ReconciliationResult<ReconciliationOutcome> {
        self.reconcile_at(collections, Utc::now())
    }

    /// Reconcile collections captured at `captured_at`.
    pub fn reconcile_at(
        &self,
        mut collections: DeviceCollections,
        captured_at: DateTime<Utc>,
    ) -> ReconciliationResult<ReconciliationOutcome> {
        if let Some((collection, record)) = collections.find_misplaced() {
            return Err(ReconciliationError::MisplacedRecord {
                name: record.name.clone(),
                origin: record.origin(),
                collection,
            });
        }

        let tracker = StatisticsTracker::new();
        tracker.set_totals(
            collections.directory.len(),
            collections.identity.len(),
            collections.device_management.len(),
        );

        tracing::info!(
            directory = collections.directory.len(),
            identity = collections.identity.len(),
            device_management = collections.device_management.len(),
            "Starting reconciliation pass"
        );

        Annotator::annotate(&mut collections);
        let participation = Participation::evaluate(&self.config, &collections);
        CrossReferencer::new(&self.config).cross_reference(
            &mut collections,
            &participation,
            &tracker,
        );
        let broken = DuplicateResolver::new(self.config.name_matching)
            .resolve(&collections.identity, &participation);
        tracker.set_broken(broken.len());

        let statistics = tracker.snapshot();
        let DeviceCollections {
            directory,
            identity,
            device_management,
        } = collections;

        let snapshot = self.store.replace(Snapshot {
            version: 0,
            captured_at,
            name_matching: self.config.name_matching,
            directory,
            identity,
            device_management,
            broken,
            statistics: statistics.clone(),
        });

        tracing::info!(
            version = snapshot.version,
            broken = statistics.broken_total,
            directory_in_identity = statistics.directory_in_identity,
            directory_in_device_management = statistics.directory_in_device_management,
            duration_ms = statistics.duration_ms,
            "Completed reconciliation pass"
        );

        Ok(ReconciliationOutcome {
            snapshot,
            statistics,
        })
    }

    /// Fetch all three inventories concurrently, then reconcile.
    ///
    /// # Errors
    ///
    /// Any adapter failure fails the whole refresh; the previous snapshot
    /// stays current.
    pub async fn refresh(
        &self,
        sources: &InventorySources,
    ) -> ReconciliationResult<ReconciliationOutcome> {
        sources.check_wiring()?;
        let captured_at = Utc::now();

        let (directory, identity, device_management) = tokio::try_join!(
            fetch(sources.directory.as_ref()),
            fetch(sources.identity.as_ref()),
            fetch(sources.device_management.as_ref()),
        )?;

        self.reconcile_at(
            DeviceCollections::new(directory, identity, device_management),
            captured_at,
        )
    }

    /// View of the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ReconciliationError::NotRefreshed`] before the first pass.
    pub fn view(&self) -> ReconciliationResult<SnapshotView> {
        self.store.current().map(SnapshotView::new)
    }
}

async fn fetch(adapter: &dyn DeviceInventorySource) -> ReconciliationResult<Vec<DeviceRecord>> {
    let records = adapter.fetch_devices().await.map_err(|e| {
        tracing::warn!(
            adapter = adapter.display_name(),
            source_kind = %adapter.source(),
            error = %e,
            "Inventory fetch failed"
        );
        e
    })?;
    tracing::debug!(
        adapter = adapter.display_name(),
        records = records.len(),
        "Fetched inventory"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_rejects_misplaced_records() {
        let engine = ReconciliationEngine::new(ReconciliationConfig::default());
        let collections = DeviceCollections::new(
            vec![],
            vec![DeviceRecord::new(DeviceSource::DeviceManagement, "PC1")],
            vec![],
        );
        let err = engine.reconcile(collections).unwrap_err();
        assert!(matches!(
            err,
            ReconciliationError::MisplacedRecord {
                collection: DeviceSource::IdentityService,
                origin: DeviceSource::DeviceManagement,
                ..
            }
        ));
        assert!(!engine.store().state().is_populated());
    }

    #[test]
    fn test_view_before_reconcile() {
        let engine = ReconciliationEngine::new(ReconciliationConfig::default());
        assert!(matches!(
            engine.view().unwrap_err(),
            ReconciliationError::NotRefreshed
        ));
    }

    #[test]
    fn test_reconcile_publishes_snapshot() {
        let engine = ReconciliationEngine::new(ReconciliationConfig::default());
        let captured_at = Utc::now();
        let outcome = engine
            .reconcile_at(
                DeviceCollections::new(
                    vec![DeviceRecord::new(DeviceSource::Directory, "PC1")],
                    vec![],
                    vec![],
                ),
                captured_at,
            )
            .unwrap();

        assert_eq!(outcome.snapshot.version, 1);
        assert_eq!(outcome.statistics.directory_total, 1);
        assert_eq!(outcome.statistics.directory_processed, 1);
        let view = engine.view().unwrap();
        assert_eq!(view.captured_at(), captured_at);
        assert_eq!(engine.store().captured_at(), Some(captured_at));
    }
}
