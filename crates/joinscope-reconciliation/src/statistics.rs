//! Run statistics tracking for reconciliation.
//!
//! Tracks and aggregates statistics during a reconciliation pass.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Statistics for a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Directory records in the snapshot.
    #[serde(default)]
    pub directory_total: u32,
    /// Identity-service records in the snapshot.
    #[serde(default)]
    pub identity_total: u32,
    /// Device-management records in the snapshot.
    #[serde(default)]
    pub device_management_total: u32,
    /// Directory records processed so far.
    #[serde(default)]
    pub directory_processed: u32,
    /// Directory records with at least one identity-service name match.
    #[serde(default)]
    pub directory_in_identity: u32,
    /// Directory records whose identity match is enrolled in device management.
    #[serde(default)]
    pub directory_in_device_management: u32,
    /// Directory records matching more than one identity-service record.
    #[serde(default)]
    pub ambiguous_name_matches: u32,
    /// Identity-service records with a device-management match.
    #[serde(default)]
    pub identity_in_device_management: u32,
    /// Identity-service records in the broken subset.
    #[serde(default)]
    pub broken_total: u32,
    /// Total duration in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

impl RunStatistics {
    /// Create new empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate progress percentage over the directory collection.
    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        if self.directory_total == 0 {
            0.0
        } else {
            (f64::from(self.directory_processed) / f64::from(self.directory_total)) * 100.0
        }
    }
}

/// Tracker for accumulating statistics during a pass.
pub struct StatisticsTracker {
    directory_total: AtomicU32,
    identity_total: AtomicU32,
    device_management_total: AtomicU32,
    directory_processed: AtomicU32,
    directory_in_identity: AtomicU32,
    directory_in_device_management: AtomicU32,
    ambiguous_name_matches: AtomicU32,
    identity_in_device_management: AtomicU32,
    broken_total: AtomicU32,
    /// Start time for duration calculation.
    start_time: Instant,
}

impl StatisticsTracker {
    /// Create a new tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            directory_total: AtomicU32::new(0),
            identity_total: AtomicU32::new(0),
            device_management_total: AtomicU32::new(0),
            directory_processed: AtomicU32::new(0),
            directory_in_identity: AtomicU32::new(0),
            directory_in_device_management: AtomicU32::new(0),
            ambiguous_name_matches: AtomicU32::new(0),
            identity_in_device_management: AtomicU32::new(0),
            broken_total: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Set collection sizes.
    pub fn set_totals(&self, directory: usize, identity: usize, device_management: usize) {
        self.directory_total.store(saturate(directory), Ordering::SeqCst);
        self.identity_total.store(saturate(identity), Ordering::SeqCst);
        self.device_management_total
            .store(saturate(device_management), Ordering::SeqCst);
    }

    /// Increment processed directory records.
    pub fn increment_processed(&self) {
        self.directory_processed.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a directory record found in the identity service.
    pub fn record_identity_match(&self, candidates: usize) {
        self.directory_in_identity.fetch_add(1, Ordering::SeqCst);
        if candidates > 1 {
            self.ambiguous_name_matches.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Record a directory record whose identity match is managed.
    pub fn record_management_match(&self) {
        self.directory_in_device_management
            .fetch_add(1, Ordering::SeqCst);
    }

    /// Set the number of identity records credited with device management.
    pub fn set_identity_managed(&self, count: usize) {
        self.identity_in_device_management
            .store(saturate(count), Ordering::SeqCst);
    }

    /// Set the size of the broken subset.
    pub fn set_broken(&self, count: usize) {
        self.broken_total.store(saturate(count), Ordering::SeqCst);
    }

    /// Get current processed count.
    pub fn processed_count(&self) -> u32 {
        self.directory_processed.load(Ordering::SeqCst)
    }

    /// Calculate current progress percentage.
    pub fn progress_percentage(&self) -> f64 {
        let total = self.directory_total.load(Ordering::SeqCst);
        if total == 0 {
            return 0.0;
        }
        let processed = self.directory_processed.load(Ordering::SeqCst);
        (f64::from(processed) / f64::from(total)) * 100.0
    }

    /// Snapshot current statistics.
    pub fn snapshot(&self) -> RunStatistics {
        RunStatistics {
            directory_total: self.directory_total.load(Ordering::SeqCst),
            identity_total: self.identity_total.load(Ordering::SeqCst),
            device_management_total: self.device_management_total.load(Ordering::SeqCst),
            directory_processed: self.directory_processed.load(Ordering::SeqCst),
            directory_in_identity: self.directory_in_identity.load(Ordering::SeqCst),
            directory_in_device_management: self
                .directory_in_device_management
                .load(Ordering::SeqCst),
            ambiguous_name_matches: self.ambiguous_name_matches.load(Ordering::SeqCst),
            identity_in_device_management: self
                .identity_in_device_management
                .load(Ordering::SeqCst),
            broken_total: self.broken_total.load(Ordering::SeqCst),
            duration_ms: u64::try_from(self.start_time.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl Default for StatisticsTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn saturate(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_statistics_default() {
        let stats = RunStatistics::default();
        assert_eq!(stats.directory_total, 0);
        assert_eq!(stats.broken_total, 0);
        assert!((stats.progress_percentage() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_tracker_progress() {
        let tracker = StatisticsTracker::new();
        tracker.set_totals(4, 0, 0);
        assert_eq!(tracker.processed_count(), 0);

        tracker.increment_processed();
        assert!((tracker.progress_percentage() - 25.0).abs() < f64::EPSILON);

        tracker.increment_processed();
        assert_eq!(tracker.processed_count(), 2);
        assert!((tracker.snapshot().progress_percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_tracker_matches() {
        let tracker = StatisticsTracker::new();
        tracker.record_identity_match(1);
        tracker.record_identity_match(3);
        tracker.record_management_match();
        tracker.set_identity_managed(5);
        tracker.set_broken(2);

        let stats = tracker.snapshot();
        assert_eq!(stats.directory_in_identity, 2);
        assert_eq!(stats.ambiguous_name_matches, 1);
        assert_eq!(stats.directory_in_device_management, 1);
        assert_eq!(stats.identity_in_device_management, 5);
        assert_eq!(stats.broken_total, 2);
    }
}
