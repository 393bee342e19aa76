//! Broken-set derivation.
//!
//! An identity record is broken when it is not enrolled in device management
//! and no record sharing its name is either. A single working sibling takes
//! the whole name group out of the broken set.

use std::collections::HashMap;

use joinscope_core::DeviceRecord;

use crate::config::NameMatching;
use crate::cross_reference::Participation;

/// Groups identity records by name and keeps the groups with no managed member.
pub struct DuplicateResolver {
    name_matching: NameMatching,
}

impl DuplicateResolver {
    pub fn new(name_matching: NameMatching) -> Self {
        Self { name_matching }
    }

    /// Derive the broken subset of `identity`.
    ///
    /// Groups come out in order of first appearance; members keep their
    /// collection order. Only records marked as participating are grouped.
    pub fn resolve(
        &self,
        identity: &[DeviceRecord],
        participation: &Participation,
    ) -> Vec<DeviceRecord> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&DeviceRecord>> = HashMap::new();

        for (index, record) in identity.iter().enumerate() {
            if !participation.identity(index) {
                continue;
            }
            let key = self.name_matching.key(&record.name);
            let group = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            group.push(record);
        }

        let mut broken = Vec::new();
        for key in &order {
            let Some(members) = groups.get(key) else {
                continue;
            };
            if members.iter().any(|m| m.flags().in_device_management()) {
                continue;
            }
            if members.len() > 1 {
                tracing::debug!(
                    name = %members[0].name,
                    members = members.len(),
                    "Duplicate identity records without a managed sibling"
                );
            }
            broken.extend(members.iter().map(|m| (*m).clone()));
        }
        broken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::DeviceCollections;
    use crate::config::ReconciliationConfig;
    use joinscope_core::{DeviceFilter, DeviceSource};

    fn ident(name: &str, managed: bool) -> DeviceRecord {
        let mut record = DeviceRecord::new(DeviceSource::IdentityService, name);
        if managed {
            record.mark_present(DeviceSource::DeviceManagement);
        }
        record
    }

    fn everyone(identity: &[DeviceRecord]) -> Participation {
        let collections = DeviceCollections::new(vec![], identity.to_vec(), vec![]);
        Participation::evaluate(&ReconciliationConfig::default(), &collections)
    }

    fn names(records: &[DeviceRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_managed_sibling_excludes_group() {
        let identity = vec![ident("PC2", true), ident("pc2", false)];
        let resolver = DuplicateResolver::new(NameMatching::default());
        assert!(resolver.resolve(&identity, &everyone(&identity)).is_empty());
    }

    #[test]
    fn test_unmanaged_group_is_broken_in_order() {
        let identity = vec![
            ident("B", false),
            ident("A", false),
            ident("C", true),
            ident("b", false),
        ];
        let resolver = DuplicateResolver::new(NameMatching::default());
        let broken = resolver.resolve(&identity, &everyone(&identity));
        assert_eq!(names(&broken), vec!["B", "b", "A"]);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let identity = vec![ident("A", false), ident("B", true), ident("A", false)];
        let resolver = DuplicateResolver::new(NameMatching::default());
        let first = resolver.resolve(&identity, &everyone(&identity));
        let second = resolver.resolve(&identity, &everyone(&identity));
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_participating_records_are_ignored() {
        let identity = vec![
            ident("PC1", false).with_attribute("operatingSystem", "iOS"),
            ident("PC2", false).with_attribute("operatingSystem", "Windows"),
        ];
        let config = ReconciliationConfig::default()
            .with_identity_filter(DeviceFilter::eq("operatingSystem", "Windows"));
        let collections = DeviceCollections::new(vec![], identity.clone(), vec![]);
        let participation = Participation::evaluate(&config, &collections);

        let broken = DuplicateResolver::new(config.name_matching).resolve(&identity, &participation);
        assert_eq!(names(&broken), vec!["PC2"]);
    }
}
