//! Device record model.

use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeValue, Attributes};
use crate::types::DeviceSource;

/// Per-source presence flags.
///
/// Flags can be raised but never lowered: the only way back to a lower state
/// is [`PresenceFlags::home`], which the annotator uses to start a new pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresenceFlags {
    in_directory: bool,
    in_identity_service: bool,
    in_device_management: bool,
}

impl PresenceFlags {
    /// Flags for a record present only in its home collection.
    #[must_use]
    pub fn home(origin: DeviceSource) -> Self {
        let mut flags = Self {
            in_directory: false,
            in_identity_service: false,
            in_device_management: false,
        };
        flags.mark(origin);
        flags
    }

    /// Raise the flag for `source`.
    pub fn mark(&mut self, source: DeviceSource) {
        match source {
            DeviceSource::Directory => self.in_directory = true,
            DeviceSource::IdentityService => self.in_identity_service = true,
            DeviceSource::DeviceManagement => self.in_device_management = true,
        }
    }

    /// Check the flag for `source`.
    #[must_use]
    pub fn is_present(&self, source: DeviceSource) -> bool {
        match source {
            DeviceSource::Directory => self.in_directory,
            DeviceSource::IdentityService => self.in_identity_service,
            DeviceSource::DeviceManagement => self.in_device_management,
        }
    }

    #[must_use]
    pub fn in_directory(&self) -> bool {
        self.in_directory
    }

    #[must_use]
    pub fn in_identity_service(&self) -> bool {
        self.in_identity_service
    }

    #[must_use]
    pub fn in_device_management(&self) -> bool {
        self.in_device_management
    }

    /// Present in all three sources.
    #[must_use]
    pub fn is_fully_reconciled(&self) -> bool {
        self.in_directory && self.in_identity_service && self.in_device_management
    }

    /// True if every flag raised in `earlier` is still raised here.
    #[must_use]
    pub fn includes(&self, earlier: &PresenceFlags) -> bool {
        DeviceSource::all()
            .iter()
            .all(|s| !earlier.is_present(*s) || self.is_present(*s))
    }
}

/// A device entry from one of the three inventories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device name as the source reports it.
    pub name: String,
    /// Identity-service device ID (`deviceId` / `azureADDeviceId`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_id: Option<String>,
    origin: DeviceSource,
    flags: PresenceFlags,
    /// Source-specific pass-through attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

impl DeviceRecord {
    /// Create a record present only in its home collection.
    pub fn new(origin: DeviceSource, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secondary_id: None,
            origin,
            flags: PresenceFlags::home(origin),
            attributes: Attributes::new(),
        }
    }

    /// Set the secondary identifier.
    #[must_use]
    pub fn with_secondary_id(mut self, id: impl Into<String>) -> Self {
        self.secondary_id = Some(id.into());
        self
    }

    /// Add a pass-through attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.set(name, value);
        self
    }

    /// Replace all pass-through attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// The home collection of this record.
    #[must_use]
    pub fn origin(&self) -> DeviceSource {
        self.origin
    }

    /// Current presence flags.
    #[must_use]
    pub fn flags(&self) -> PresenceFlags {
        self.flags
    }

    /// Record that this device was found in `source`.
    pub fn mark_present(&mut self, source: DeviceSource) {
        self.flags.mark(source);
    }

    /// Drop every flag except the home flag.
    pub fn reset_presence(&mut self) {
        self.flags = PresenceFlags::home(self.origin);
    }

    /// Secondary identifier, treating empty strings as absent.
    #[must_use]
    pub fn secondary_id(&self) -> Option<&str> {
        self.secondary_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_flags() {
        for source in DeviceSource::all() {
            let flags = PresenceFlags::home(*source);
            for other in DeviceSource::all() {
                assert_eq!(flags.is_present(*other), other == source);
            }
        }
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut flags = PresenceFlags::home(DeviceSource::Directory);
        flags.mark(DeviceSource::IdentityService);
        flags.mark(DeviceSource::IdentityService);
        assert!(flags.in_directory());
        assert!(flags.in_identity_service());
        assert!(!flags.in_device_management());
    }

    #[test]
    fn test_includes() {
        let before = PresenceFlags::home(DeviceSource::IdentityService);
        let mut after = before;
        after.mark(DeviceSource::DeviceManagement);
        assert!(after.includes(&before));
        assert!(!before.includes(&after));
    }

    #[test]
    fn test_reset_presence_keeps_home() {
        let mut record = DeviceRecord::new(DeviceSource::DeviceManagement, "PC1");
        record.mark_present(DeviceSource::Directory);
        record.reset_presence();
        assert_eq!(
            record.flags(),
            PresenceFlags::home(DeviceSource::DeviceManagement)
        );
    }

    #[test]
    fn test_blank_secondary_id_is_absent() {
        let record = DeviceRecord::new(DeviceSource::IdentityService, "PC1").with_secondary_id("  ");
        assert_eq!(record.secondary_id(), None);
    }

    #[test]
    fn test_record_serde() {
        let record = DeviceRecord::new(DeviceSource::IdentityService, "PC1")
            .with_secondary_id("abc")
            .with_attribute("trustType", "ServerAd");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["origin"], "identity_service");
        assert_eq!(json["flags"]["in_identity_service"], true);
        let back: DeviceRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
