//! Presence annotation.
//!
//! Every pass starts from records that claim membership in their home
//! collection only; whatever flags the input carried are discarded.

use joinscope_core::{DeviceRecord, DeviceSource};
use serde::{Deserialize, Serialize};

/// The three inventories of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceCollections {
    /// Directory (AD) computer records.
    pub directory: Vec<DeviceRecord>,
    /// Identity-service (Entra ID) device records.
    pub identity: Vec<DeviceRecord>,
    /// Device-management (Intune) records.
    pub device_management: Vec<DeviceRecord>,
}

impl DeviceCollections {
    /// Bundle three fetched collections.
    pub fn new(
        directory: Vec<DeviceRecord>,
        identity: Vec<DeviceRecord>,
        device_management: Vec<DeviceRecord>,
    ) -> Self {
        Self {
            directory,
            identity,
            device_management,
        }
    }

    /// Records of one inventory.
    pub fn get(&self, source: DeviceSource) -> &[DeviceRecord] {
        match source {
            DeviceSource::Directory => &self.directory,
            DeviceSource::IdentityService => &self.identity,
            DeviceSource::DeviceManagement => &self.device_management,
        }
    }

    /// Total number of records across all inventories.
    pub fn total(&self) -> usize {
        self.directory.len() + self.identity.len() + self.device_management.len()
    }

    /// First record whose origin does not match the collection it sits in.
    pub fn find_misplaced(&self) -> Option<(DeviceSource, &DeviceRecord)> {
        DeviceSource::all().iter().find_map(|source| {
            self.get(*source)
                .iter()
                .find(|r| r.origin() != *source)
                .map(|r| (*source, r))
        })
    }
}

/// Stamps home-only presence flags on every record.
pub struct Annotator;

impl Annotator {
    /// Annotate all three collections in place.
    pub fn annotate(collections: &mut DeviceCollections) {
        for record in collections
            .directory
            .iter_mut()
            .chain(collections.identity.iter_mut())
            .chain(collections.device_management.iter_mut())
        {
            record.reset_presence();
        }
    }
}
