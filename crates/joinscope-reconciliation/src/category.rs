//! Standard device categories.
//!
//! Each category is a filter over one collection of a snapshot, so the same
//! answers are available through ad-hoc queries.

use std::fmt;
use std::str::FromStr;

use joinscope_core::{DeviceFilter, DeviceSource};
use serde::{Deserialize, Serialize};

use crate::error::ReconciliationError;
use crate::query::Collection;

/// Standard reconciliation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceCategory {
    /// Directory records found in neither cloud service.
    DirectoryOnly,
    /// Directory records with no identity-service record of the same name.
    DirectoryNotInIdentity,
    /// Identity records no directory record points at.
    IdentityNotInDirectory,
    /// Identity records not enrolled in device management.
    IdentityNotManaged,
    /// Device-management records with no identity record.
    ManagementWithoutIdentity,
    /// Directory records present in all three sources.
    FullyReconciled,
    /// Identity records with no managed same-named sibling.
    Broken,
}

impl DeviceCategory {
    pub fn all() -> &'static [DeviceCategory] {
        &[
            DeviceCategory::DirectoryOnly,
            DeviceCategory::DirectoryNotInIdentity,
            DeviceCategory::IdentityNotInDirectory,
            DeviceCategory::IdentityNotManaged,
            DeviceCategory::ManagementWithoutIdentity,
            DeviceCategory::FullyReconciled,
            DeviceCategory::Broken,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceCategory::DirectoryOnly => "directory-only",
            DeviceCategory::DirectoryNotInIdentity => "directory-not-in-identity",
            DeviceCategory::IdentityNotInDirectory => "identity-not-in-directory",
            DeviceCategory::IdentityNotManaged => "identity-not-managed",
            DeviceCategory::ManagementWithoutIdentity => "management-without-identity",
            DeviceCategory::FullyReconciled => "fully-reconciled",
            DeviceCategory::Broken => "broken",
        }
    }

    /// One-line description for reports.
    pub fn description(&self) -> &'static str {
        match self {
            DeviceCategory::DirectoryOnly => "In the directory only",
            DeviceCategory::DirectoryNotInIdentity => "In the directory, missing from the identity service",
            DeviceCategory::IdentityNotInDirectory => "In the identity service, missing from the directory",
            DeviceCategory::IdentityNotManaged => "In the identity service, not enrolled in device management",
            DeviceCategory::ManagementWithoutIdentity => "Enrolled in device management, no identity record",
            DeviceCategory::FullyReconciled => "Present in all three sources",
            DeviceCategory::Broken => "Broken: no managed record under the same name",
        }
    }

    /// The collection this category selects from.
    pub fn collection(&self) -> Collection {
        match self {
            DeviceCategory::DirectoryOnly
            | DeviceCategory::DirectoryNotInIdentity
            | DeviceCategory::FullyReconciled => Collection::Directory,
            DeviceCategory::IdentityNotInDirectory | DeviceCategory::IdentityNotManaged => {
                Collection::Identity
            }
            DeviceCategory::ManagementWithoutIdentity => Collection::DeviceManagement,
            DeviceCategory::Broken => Collection::Broken,
        }
    }

    /// The filter applied to [`DeviceCategory::collection`].
    pub fn filter(&self) -> DeviceFilter {
        match self {
            DeviceCategory::DirectoryOnly => DeviceFilter::and(vec![
                DeviceFilter::absent_from(DeviceSource::IdentityService),
                DeviceFilter::absent_from(DeviceSource::DeviceManagement),
            ]),
            DeviceCategory::DirectoryNotInIdentity => {
                DeviceFilter::absent_from(DeviceSource::IdentityService)
            }
            DeviceCategory::IdentityNotInDirectory => {
                DeviceFilter::absent_from(DeviceSource::Directory)
            }
            DeviceCategory::IdentityNotManaged => {
                DeviceFilter::absent_from(DeviceSource::DeviceManagement)
            }
            DeviceCategory::ManagementWithoutIdentity => {
                DeviceFilter::absent_from(DeviceSource::IdentityService)
            }
            DeviceCategory::FullyReconciled => DeviceFilter::and(vec![
                DeviceFilter::present_in(DeviceSource::IdentityService),
                DeviceFilter::present_in(DeviceSource::DeviceManagement),
            ]),
            DeviceCategory::Broken => DeviceFilter::All,
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceCategory {
    type Err = ReconciliationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        DeviceCategory::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ReconciliationError::UnknownName {
                kind: "category",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinscope_core::DeviceRecord;

    #[test]
    fn test_category_from_str() {
        for category in DeviceCategory::all() {
            assert_eq!(category.as_str().parse::<DeviceCategory>().unwrap(), *category);
        }
        assert_eq!(
            "identity_not_managed".parse::<DeviceCategory>().unwrap(),
            DeviceCategory::IdentityNotManaged
        );
        assert!("stale".parse::<DeviceCategory>().is_err());
    }

    #[test]
    fn test_directory_only_filter() {
        let lonely = DeviceRecord::new(DeviceSource::Directory, "PC1");
        let mut joined = DeviceRecord::new(DeviceSource::Directory, "PC2");
        joined.mark_present(DeviceSource::IdentityService);

        let filter = DeviceCategory::DirectoryOnly.filter();
        assert!(filter.matches(&lonely));
        assert!(!filter.matches(&joined));
        assert!(DeviceCategory::DirectoryNotInIdentity.filter().matches(&lonely));
        assert!(!DeviceCategory::FullyReconciled.filter().matches(&joined));

        joined.mark_present(DeviceSource::DeviceManagement);
        assert!(DeviceCategory::FullyReconciled.filter().matches(&joined));
    }

    #[test]
    fn test_category_collections() {
        assert_eq!(DeviceCategory::Broken.collection(), Collection::Broken);
        assert_eq!(
            DeviceCategory::ManagementWithoutIdentity.collection(),
            Collection::DeviceManagement
        );
    }
}
