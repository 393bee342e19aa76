//! Source type definitions
//!
//! Enum identifying which inventory a device record came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inventory a device record originates from (its home collection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSource {
    /// On-premises directory service (Active Directory computer objects)
    Directory,
    /// Cloud identity service (Entra ID device objects)
    IdentityService,
    /// Device-management service (Intune managed devices)
    DeviceManagement,
}

impl DeviceSource {
    /// Get all sources, in reconciliation order.
    #[must_use]
    pub fn all() -> &'static [DeviceSource] {
        &[
            DeviceSource::Directory,
            DeviceSource::IdentityService,
            DeviceSource::DeviceManagement,
        ]
    }

    /// Get the string representation used in exports and the CLI.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceSource::Directory => "directory",
            DeviceSource::IdentityService => "identity",
            DeviceSource::DeviceManagement => "mdm",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DeviceSource::Directory => "Directory",
            DeviceSource::IdentityService => "Identity service",
            DeviceSource::DeviceManagement => "Device management",
        }
    }
}

impl fmt::Display for DeviceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeviceSource {
    type Err = ParseDeviceSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "directory" | "ad" => Ok(DeviceSource::Directory),
            "identity" | "entra" | "identity_service" => Ok(DeviceSource::IdentityService),
            "mdm" | "intune" | "device_management" => Ok(DeviceSource::DeviceManagement),
            _ => Err(ParseDeviceSourceError(s.to_string())),
        }
    }
}

/// Error parsing a device source from string.
#[derive(Debug, Clone)]
pub struct ParseDeviceSourceError(String);

impl fmt::Display for ParseDeviceSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid device source '{}', expected one of: directory, identity, mdm",
            self.0
        )
    }
}

impl std::error::Error for ParseDeviceSourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_source_roundtrip() {
        for source in DeviceSource::all() {
            let parsed: DeviceSource = source.as_str().parse().unwrap();
            assert_eq!(parsed, *source);
        }
    }

    #[test]
    fn test_device_source_aliases() {
        assert_eq!("AD".parse::<DeviceSource>().unwrap(), DeviceSource::Directory);
        assert_eq!(
            "Entra".parse::<DeviceSource>().unwrap(),
            DeviceSource::IdentityService
        );
        assert_eq!(
            "intune".parse::<DeviceSource>().unwrap(),
            DeviceSource::DeviceManagement
        );
    }

    #[test]
    fn test_device_source_invalid() {
        let err = "ldap".parse::<DeviceSource>().unwrap_err();
        assert!(err.to_string().contains("ldap"));
    }

    #[test]
    fn test_device_source_serde() {
        let json = serde_json::to_string(&DeviceSource::IdentityService).unwrap();
        assert_eq!(json, "\"identity_service\"");
    }
}
