//! Read-only query surface over a snapshot.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use joinscope_core::{DeviceFilter, DeviceRecord, DeviceSource};
use serde::{Deserialize, Serialize};

use crate::error::ReconciliationError;
use crate::snapshot::Snapshot;

/// A queryable collection of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Directory,
    Identity,
    DeviceManagement,
    /// Identity records with no managed same-named sibling.
    Broken,
}

impl Collection {
    /// All collections in export order.
    pub fn all() -> &'static [Collection] {
        &[
            Collection::Directory,
            Collection::Identity,
            Collection::DeviceManagement,
            Collection::Broken,
        ]
    }

    /// Stable short name, also used for export file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Directory => "directory",
            Collection::Identity => "identity",
            Collection::DeviceManagement => "mdm",
            Collection::Broken => "broken",
        }
    }
}

impl From<DeviceSource> for Collection {
    fn from(source: DeviceSource) -> Self {
        match source {
            DeviceSource::Directory => Collection::Directory,
            DeviceSource::IdentityService => Collection::Identity,
            DeviceSource::DeviceManagement => Collection::DeviceManagement,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = ReconciliationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("broken") {
            return Ok(Collection::Broken);
        }
        s.parse::<DeviceSource>()
            .map(Collection::from)
            .map_err(|_| ReconciliationError::UnknownName {
                kind: "collection",
                value: s.to_string(),
            })
    }
}

/// Presence of one device name across the three sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenceReport {
    /// The name that was looked up.
    pub name: String,
    pub in_directory: bool,
    pub in_identity_service: bool,
    pub in_device_management: bool,
    /// Whether any same-named identity record is in the broken subset.
    pub broken: bool,
    /// Every record carrying the name, directory first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<DeviceRecord>,
}

impl PresenceReport {
    /// Whether the name was found anywhere.
    #[must_use]
    pub fn found(&self) -> bool {
        self.in_directory || self.in_identity_service || self.in_device_management
    }
}

/// Immutable view over one snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotView {
    snapshot: Arc<Snapshot>,
}

impl SnapshotView {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }

    /// The underlying snapshot.
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    pub fn version(&self) -> u64 {
        self.snapshot.version
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.snapshot.captured_at
    }

    /// All records of a collection.
    pub fn collection(&self, collection: Collection) -> &[DeviceRecord] {
        match collection {
            Collection::Directory => &self.snapshot.directory,
            Collection::Identity => &self.snapshot.identity,
            Collection::DeviceManagement => &self.snapshot.device_management,
            Collection::Broken => &self.snapshot.broken,
        }
    }

    /// Records of a collection matching a filter expression.
    pub fn filter(&self, collection: Collection, filter: &DeviceFilter) -> Vec<&DeviceRecord> {
        self.filter_with(collection, |record| filter.matches(record))
    }

    /// Records of a collection matching a caller-supplied predicate.
    pub fn filter_with<F>(&self, collection: Collection, predicate: F) -> Vec<&DeviceRecord>
    where
        F: Fn(&DeviceRecord) -> bool,
    {
        self.collection(collection)
            .iter()
            .filter(|record| predicate(record))
            .collect()
    }

    /// Count records of a collection matching a filter expression.
    pub fn count(&self, collection: Collection, filter: &DeviceFilter) -> usize {
        self.collection(collection)
            .iter()
            .filter(|record| filter.matches(record))
            .count()
    }

    /// Probe all three collections for `name`.
    ///
    /// An unknown name yields an all-false report.
    pub fn lookup_by_name(&self, name: &str) -> PresenceReport {
        let matching = self.snapshot.name_matching;
        let key = matching.key(name);
        let same = |record: &&DeviceRecord| matching.key(&record.name) == key;

        let mut report = PresenceReport {
            name: name.to_string(),
            ..PresenceReport::default()
        };
        for source in DeviceSource::all() {
            let found: Vec<&DeviceRecord> =
                self.snapshot.records(*source).iter().filter(same).collect();
            if found.is_empty() {
                continue;
            }
            match source {
                DeviceSource::Directory => report.in_directory = true,
                DeviceSource::IdentityService => report.in_identity_service = true,
                DeviceSource::DeviceManagement => report.in_device_management = true,
            }
            report.records.extend(found.into_iter().cloned());
        }
        report.broken = self.snapshot.broken.iter().any(|r| same(&r));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NameMatching;
    use crate::statistics::RunStatistics;

    fn view() -> SnapshotView {
        let mut managed = DeviceRecord::new(DeviceSource::IdentityService, "PC1")
            .with_attribute("operatingSystem", "Windows");
        managed.mark_present(DeviceSource::DeviceManagement);
        let orphan = DeviceRecord::new(DeviceSource::IdentityService, "PC3")
            .with_attribute("operatingSystem", "Windows");

        SnapshotView::new(Arc::new(Snapshot {
            version: 1,
            captured_at: Utc::now(),
            name_matching: NameMatching::default(),
            directory: vec![DeviceRecord::new(DeviceSource::Directory, "PC1")],
            identity: vec![managed, orphan.clone()],
            device_management: vec![DeviceRecord::new(DeviceSource::DeviceManagement, "PC1")],
            broken: vec![orphan],
            statistics: RunStatistics::default(),
        }))
    }

    #[test]
    fn test_collection_from_str() {
        assert_eq!("broken".parse::<Collection>().unwrap(), Collection::Broken);
        assert_eq!("intune".parse::<Collection>().unwrap(), Collection::DeviceManagement);
        assert_eq!("entra".parse::<Collection>().unwrap(), Collection::Identity);
        assert!("printer".parse::<Collection>().is_err());
    }

    #[test]
    fn test_filter_by_expression() {
        let view = view();
        let unmanaged = view.filter(
            Collection::Identity,
            &DeviceFilter::absent_from(DeviceSource::DeviceManagement),
        );
        assert_eq!(unmanaged.len(), 1);
        assert_eq!(unmanaged[0].name, "PC3");
    }

    #[test]
    fn test_filter_with_closure() {
        let view = view();
        let found = view.filter_with(Collection::Identity, |r| r.name.ends_with('1'));
        assert_eq!(found.len(), 1);
        assert_eq!(view.count(Collection::Broken, &DeviceFilter::All), 1);
    }

    #[test]
    fn test_lookup_known_name() {
        let report = view().lookup_by_name("pc1");
        assert!(report.in_directory);
        assert!(report.in_identity_service);
        assert!(report.in_device_management);
        assert!(!report.broken);
        assert_eq!(report.records.len(), 3);
    }

    #[test]
    fn test_lookup_unknown_name_is_all_false() {
        let report = view().lookup_by_name("GHOST");
        assert!(!report.found());
        assert!(!report.in_directory);
        assert!(!report.in_identity_service);
        assert!(!report.in_device_management);
        assert!(!report.broken);
        assert!(report.records.is_empty());
    }

    #[test]
    fn test_lookup_broken_name() {
        let report = view().lookup_by_name("PC3");
        assert!(report.broken);
        assert!(report.in_identity_service);
        assert!(!report.in_directory);
    }
}
