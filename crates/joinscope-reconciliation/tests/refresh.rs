//! Refresh behavior with in-memory adapters.

use async_trait::async_trait;
use joinscope_core::{
    DeviceInventorySource, DeviceRecord, DeviceSource, SourceError, SourceResult,
};
use joinscope_reconciliation::{
    InventorySources, ReconciliationConfig, ReconciliationEngine, ReconciliationError,
};

struct MemorySource {
    source: DeviceSource,
    names: Vec<(&'static str, Option<&'static str>)>,
    fail: bool,
}

impl MemorySource {
    fn new(source: DeviceSource, names: Vec<(&'static str, Option<&'static str>)>) -> Box<Self> {
        Box::new(Self {
            source,
            names,
            fail: false,
        })
    }

    fn failing(source: DeviceSource) -> Box<Self> {
        Box::new(Self {
            source,
            names: vec![],
            fail: true,
        })
    }
}

#[async_trait]
impl DeviceInventorySource for MemorySource {
    fn source(&self) -> DeviceSource {
        self.source
    }

    fn display_name(&self) -> &str {
        "memory"
    }

    async fn test_connection(&self) -> SourceResult<()> {
        Ok(())
    }

    async fn fetch_devices(&self) -> SourceResult<Vec<DeviceRecord>> {
        if self.fail {
            return Err(SourceError::Unavailable {
                source_kind: self.source,
                message: "throttled".to_string(),
            });
        }
        Ok(self
            .names
            .iter()
            .map(|(name, id)| {
                let record = DeviceRecord::new(self.source, *name);
                match id {
                    Some(id) => record.with_secondary_id(*id),
                    None => record,
                }
            })
            .collect())
    }
}

fn healthy() -> InventorySources {
    InventorySources::new(
        MemorySource::new(DeviceSource::Directory, vec![("PC1", None)]),
        MemorySource::new(DeviceSource::IdentityService, vec![("PC1", Some("X"))]),
        MemorySource::new(DeviceSource::DeviceManagement, vec![("PC1", Some("X"))]),
    )
}

#[tokio::test]
async fn refresh_fetches_and_publishes() {
    let engine = ReconciliationEngine::new(ReconciliationConfig::default());
    let outcome = engine.refresh(&healthy()).await.unwrap();

    assert_eq!(outcome.snapshot.version, 1);
    assert!(outcome.snapshot.directory[0].flags().is_fully_reconciled());
    assert_eq!(engine.store().version(), 1);
}

#[tokio::test]
async fn failed_fetch_keeps_previous_snapshot() {
    let engine = ReconciliationEngine::new(ReconciliationConfig::default());
    let first = engine.refresh(&healthy()).await.unwrap();

    let broken_sources = InventorySources::new(
        MemorySource::new(DeviceSource::Directory, vec![("PC2", None)]),
        MemorySource::failing(DeviceSource::IdentityService),
        MemorySource::new(DeviceSource::DeviceManagement, vec![]),
    );
    let err = engine.refresh(&broken_sources).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::Source(_)));
    assert!(err.is_transient());

    let current = engine.store().current().unwrap();
    assert_eq!(current.version, first.snapshot.version);
    assert_eq!(current.directory[0].name, "PC1");
}

#[tokio::test]
async fn refresh_before_any_pass_fails_without_populating() {
    let engine = ReconciliationEngine::new(ReconciliationConfig::default());
    let sources = InventorySources::new(
        MemorySource::failing(DeviceSource::Directory),
        MemorySource::new(DeviceSource::IdentityService, vec![]),
        MemorySource::new(DeviceSource::DeviceManagement, vec![]),
    );
    assert!(engine.refresh(&sources).await.is_err());
    assert!(matches!(
        engine.view().unwrap_err(),
        ReconciliationError::NotRefreshed
    ));
}

#[tokio::test]
async fn miswired_adapter_is_rejected() {
    let engine = ReconciliationEngine::new(ReconciliationConfig::default());
    let sources = InventorySources::new(
        MemorySource::new(DeviceSource::IdentityService, vec![]),
        MemorySource::new(DeviceSource::IdentityService, vec![]),
        MemorySource::new(DeviceSource::DeviceManagement, vec![]),
    );
    let err = engine.refresh(&sources).await.unwrap_err();
    assert!(matches!(
        err,
        ReconciliationError::SourceMismatch {
            expected: DeviceSource::Directory,
            ..
        }
    ));
}
