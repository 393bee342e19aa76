//! Cross-referencing of the three inventories.
//!
//! Directory records join identity-service records by name key; identity
//! records join device-management records by secondary identifier. Matches
//! only ever raise flags.

use std::collections::HashMap;

use joinscope_core::{DeviceRecord, DeviceSource};

use crate::annotator::DeviceCollections;
use crate::config::{secondary_key, ReconciliationConfig};
use crate::statistics::StatisticsTracker;

/// Directory records between two progress log lines.
const PROGRESS_INTERVAL: usize = 500;

/// Which records of a collection take part in the joins.
///
/// Evaluated once, before any flag is raised, so a predicate over flags sees
/// the annotated state and never a half-joined one.
#[derive(Debug, Clone)]
pub struct Participation {
    identity: Vec<bool>,
    device_management: Vec<bool>,
}

impl Participation {
    /// Evaluate the configured predicates over annotated collections.
    pub fn evaluate(config: &ReconciliationConfig, collections: &DeviceCollections) -> Self {
        Self {
            identity: collections
                .identity
                .iter()
                .map(|r| config.identity_filter.matches(r))
                .collect(),
            device_management: collections
                .device_management
                .iter()
                .map(|r| config.device_management_filter.matches(r))
                .collect(),
        }
    }

    /// Whether the identity record at `index` participates.
    pub fn identity(&self, index: usize) -> bool {
        self.identity.get(index).copied().unwrap_or(false)
    }

    /// Whether the device-management record at `index` participates.
    pub fn device_management(&self, index: usize) -> bool {
        self.device_management.get(index).copied().unwrap_or(false)
    }
}

/// Applies the name and secondary-identifier joins.
pub struct CrossReferencer<'a> {
    config: &'a ReconciliationConfig,
}

impl<'a> CrossReferencer<'a> {
    /// Create a cross-referencer for the given configuration.
    pub fn new(config: &'a ReconciliationConfig) -> Self {
        Self { config }
    }

    /// Raise presence flags on every matched record.
    pub fn cross_reference(
        &self,
        collections: &mut DeviceCollections,
        participation: &Participation,
        tracker: &StatisticsTracker,
    ) {
        self.join_directory(collections, participation, tracker);
        self.join_identity_to_management(collections, participation, tracker);
    }

    /// Directory pass: name join to identity, then first candidate with a
    /// managed secondary id.
    pub fn join_directory(
        &self,
        collections: &mut DeviceCollections,
        participation: &Participation,
        tracker: &StatisticsTracker,
    ) {
        let name_index = self.name_index(&collections.identity, participation);
        let management_index = management_index(&collections.device_management, participation);

        let DeviceCollections {
            directory,
            identity,
            device_management,
        } = collections;

        let total = directory.len();
        for (position, dir_record) in directory.iter_mut().enumerate() {
            let key = self.config.name_matching.key(&dir_record.name);
            if let Some(candidates) = name_index.get(&key) {
                tracker.record_identity_match(candidates.len());
                dir_record.mark_present(DeviceSource::IdentityService);

                if candidates.len() > 1 {
                    tracing::debug!(
                        name = %dir_record.name,
                        candidates = candidates.len(),
                        "Directory record matches several identity records"
                    );
                }

                for &candidate in candidates {
                    let id_record = &mut identity[candidate];
                    id_record.mark_present(DeviceSource::Directory);

                    let managed = id_record
                        .secondary_id()
                        .and_then(|id| management_index.get(&secondary_key(id)));
                    if let Some(managed) = managed {
                        dir_record.mark_present(DeviceSource::DeviceManagement);
                        id_record.mark_present(DeviceSource::DeviceManagement);
                        for &m in managed {
                            device_management[m].mark_present(DeviceSource::IdentityService);
                            device_management[m].mark_present(DeviceSource::Directory);
                        }
                        tracker.record_management_match();
                        break;
                    }
                }
            }

            tracker.increment_processed();
            if (position + 1) % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    processed = position + 1,
                    total,
                    progress = %format!("{:.1}%", tracker.progress_percentage()),
                    "Cross-referencing directory records"
                );
            }
        }

        tracing::debug!(directory = total, "Directory pass complete");
    }

    /// Direct join of participating identity records to device management.
    ///
    /// Cloud-only devices have no directory record to reach them through.
    /// Never touches `in_directory`.
    pub fn join_identity_to_management(
        &self,
        collections: &mut DeviceCollections,
        participation: &Participation,
        tracker: &StatisticsTracker,
    ) {
        let management_index = management_index(&collections.device_management, participation);
        let DeviceCollections {
            identity,
            device_management,
            ..
        } = collections;

        let mut identity_managed = 0;
        for (index, id_record) in identity.iter_mut().enumerate() {
            if !participation.identity(index) {
                continue;
            }
            let managed = id_record
                .secondary_id()
                .and_then(|id| management_index.get(&secondary_key(id)));
            if let Some(managed) = managed {
                id_record.mark_present(DeviceSource::DeviceManagement);
                for &m in managed {
                    device_management[m].mark_present(DeviceSource::IdentityService);
                }
            }
            if id_record.flags().in_device_management() {
                identity_managed += 1;
            }
        }
        tracker.set_identity_managed(identity_managed);

        tracing::debug!(identity_managed, "Cross-referencing complete");
    }

    /// Participating identity indices keyed by name key, in collection order.
    fn name_index(
        &self,
        identity: &[DeviceRecord],
        participation: &Participation,
    ) -> HashMap<String, Vec<usize>> {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, record) in identity.iter().enumerate() {
            if participation.identity(i) {
                index
                    .entry(self.config.name_matching.key(&record.name))
                    .or_default()
                    .push(i);
            }
        }
        index
    }
}

/// Participating device-management indices keyed by normalized secondary id.
fn management_index(
    device_management: &[DeviceRecord],
    participation: &Participation,
) -> HashMap<String, Vec<usize>> {
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, record) in device_management.iter().enumerate() {
        if !participation.device_management(i) {
            continue;
        }
        if let Some(id) = record.secondary_id() {
            index.entry(secondary_key(id)).or_default().push(i);
        }
    }
    index
}
