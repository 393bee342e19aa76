//! Reconciliation configuration.

use joinscope_core::DeviceFilter;
use serde::{Deserialize, Serialize};

/// Rules for turning a device name into a join key.
///
/// Matching is always exact on the resulting key; these rules only decide
/// what "the same name" means for a given environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMatching {
    /// Whether to ignore case when comparing names.
    #[serde(default = "default_ignore_case")]
    pub ignore_case: bool,
    /// Whether to strip leading and trailing whitespace.
    #[serde(default = "default_trim_whitespace")]
    pub trim_whitespace: bool,
    /// Whether to drop everything after the first dot (`PC1.corp.local` -> `PC1`).
    #[serde(default)]
    pub trim_dns_suffix: bool,
}

fn default_ignore_case() -> bool {
    true
}

fn default_trim_whitespace() -> bool {
    true
}

impl Default for NameMatching {
    fn default() -> Self {
        Self {
            ignore_case: default_ignore_case(),
            trim_whitespace: default_trim_whitespace(),
            trim_dns_suffix: false,
        }
    }
}

impl NameMatching {
    /// Join key for `name`.
    #[must_use]
    pub fn key(&self, name: &str) -> String {
        let trimmed = if self.trim_whitespace {
            name.trim()
        } else {
            name
        };
        let base = if self.trim_dns_suffix {
            trimmed.split('.').next().unwrap_or(trimmed)
        } else {
            trimmed
        };
        if self.ignore_case {
            base.to_lowercase()
        } else {
            base.to_string()
        }
    }

    /// Check whether two names refer to the same device.
    #[must_use]
    pub fn same_name(&self, left: &str, right: &str) -> bool {
        self.key(left) == self.key(right)
    }
}

/// Configuration for a reconciliation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// Name normalization for the directory/identity join, duplicate grouping
    /// and lookups.
    #[serde(flatten)]
    pub name_matching: NameMatching,
    /// Identity-service records that take part in the joins.
    #[serde(default)]
    pub identity_filter: DeviceFilter,
    /// Device-management records that take part in the joins.
    #[serde(default)]
    pub device_management_filter: DeviceFilter,
}

impl ReconciliationConfig {
    /// Restrict identity-service records taking part in the joins.
    #[must_use]
    pub fn with_identity_filter(mut self, filter: DeviceFilter) -> Self {
        self.identity_filter = filter;
        self
    }

    /// Restrict device-management records taking part in the joins.
    #[must_use]
    pub fn with_device_management_filter(mut self, filter: DeviceFilter) -> Self {
        self.device_management_filter = filter;
        self
    }

    /// Use the given name matching rules.
    #[must_use]
    pub fn with_name_matching(mut self, name_matching: NameMatching) -> Self {
        self.name_matching = name_matching;
        self
    }
}

/// Normalize a secondary identifier for comparison (GUIDs differ in case
/// between Graph endpoints).
pub(crate) fn secondary_key(id: &str) -> String {
    id.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciliation_config_default() {
        let config = ReconciliationConfig::default();
        assert!(config.name_matching.ignore_case);
        assert!(config.name_matching.trim_whitespace);
        assert!(!config.name_matching.trim_dns_suffix);
        assert_eq!(config.identity_filter, DeviceFilter::All);
        assert_eq!(config.device_management_filter, DeviceFilter::All);
    }

    #[test]
    fn test_name_key_ignore_case() {
        let matching = NameMatching::default();
        assert!(matching.same_name("PC1", "pc1"));
        assert!(!matching.same_name("PC1", "PC1.corp.local"));
    }

    #[test]
    fn test_name_key_case_sensitive() {
        let matching = NameMatching {
            ignore_case: false,
            trim_whitespace: true,
            trim_dns_suffix: false,
        };
        assert!(!matching.same_name("PC1", "pc1"));
        assert!(matching.same_name("PC1", " PC1 "));
    }

    #[test]
    fn test_name_key_keeps_whitespace() {
        let matching = NameMatching {
            ignore_case: false,
            trim_whitespace: false,
            trim_dns_suffix: false,
        };
        assert_eq!(matching.key(" PC1 "), " PC1 ");
        assert!(!matching.same_name("PC1", " PC1 "));
        assert!(matching.same_name("PC1", "PC1"));
    }

    #[test]
    fn test_name_key_trim_dns_suffix() {
        let matching = NameMatching {
            ignore_case: true,
            trim_whitespace: true,
            trim_dns_suffix: true,
        };
        assert_eq!(matching.key("PC1.corp.local"), "pc1");
        assert!(matching.same_name("PC1", "pc1.corp.local"));
    }

    #[test]
    fn test_config_deserialize_flattened() {
        let json = serde_json::json!({
            "ignore_case": false,
            "identity_filter": {"type": "equals", "attribute": "operatingSystem", "value": "Windows"}
        });
        let config: ReconciliationConfig = serde_json::from_value(json).unwrap();
        assert!(!config.name_matching.ignore_case);
        assert!(config.name_matching.trim_whitespace);
        assert_eq!(
            config.identity_filter,
            DeviceFilter::eq("operatingSystem", "Windows")
        );
        assert_eq!(config.device_management_filter, DeviceFilter::All);
    }

    #[test]
    fn test_secondary_key() {
        assert_eq!(
            secondary_key(" 6A1B0C2D-AAAA-BBBB-CCCC-000000000001 "),
            "6a1b0c2d-aaaa-bbbb-cccc-000000000001"
        );
    }
}
