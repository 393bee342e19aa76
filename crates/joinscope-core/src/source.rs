//! Source adapter trait
//!
//! One adapter per backend. Adapters own authentication, paging, retries and
//! scoping; the reconciliation engine only sees complete collections.

use async_trait::async_trait;

use crate::error::SourceResult;
use crate::record::DeviceRecord;
use crate::types::DeviceSource;

/// A backend that can produce a point-in-time device inventory.
#[async_trait]
pub trait DeviceInventorySource: Send + Sync {
    /// Which collection this adapter fills.
    fn source(&self) -> DeviceSource;

    /// Get the display name for this adapter instance.
    fn display_name(&self) -> &str;

    /// Test the connection to the backend.
    ///
    /// Returns `Ok(())` if the backend is reachable and credentials are
    /// accepted.
    async fn test_connection(&self) -> SourceResult<()>;

    /// Fetch the complete device inventory.
    ///
    /// Every returned record must have [`DeviceInventorySource::source`] as its
    /// origin. A partial inventory must be reported as an error, never
    /// returned as if it were complete.
    async fn fetch_devices(&self) -> SourceResult<Vec<DeviceRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource {
        records: Vec<DeviceRecord>,
    }

    #[async_trait]
    impl DeviceInventorySource for StaticSource {
        fn source(&self) -> DeviceSource {
            DeviceSource::Directory
        }

        fn display_name(&self) -> &str {
            "static"
        }

        async fn test_connection(&self) -> SourceResult<()> {
            Ok(())
        }

        async fn fetch_devices(&self) -> SourceResult<Vec<DeviceRecord>> {
            Ok(self.records.clone())
        }
    }

    #[tokio::test]
    async fn test_trait_object_fetch() {
        let source: Box<dyn DeviceInventorySource> = Box::new(StaticSource {
            records: vec![DeviceRecord::new(DeviceSource::Directory, "PC1")],
        });
        source.test_connection().await.unwrap();
        let records = source.fetch_devices().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].origin(), source.source());
    }
}
