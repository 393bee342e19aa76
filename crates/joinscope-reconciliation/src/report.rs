//! Reconciliation report generation.
//!
//! Summarizes a snapshot: collection sizes, category counts and pass
//! performance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::DeviceCategory;
use crate::query::SnapshotView;
use crate::statistics::RunStatistics;

/// Complete reconciliation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Snapshot information.
    pub run: RunInfo,
    /// Count per standard category.
    pub categories: Vec<CategoryCount>,
    /// Performance metrics.
    pub performance: PerformanceMetrics,
}

/// Snapshot information for the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    /// Snapshot version.
    pub version: u64,
    /// Capture time.
    pub captured_at: DateTime<Utc>,
    /// Statistics.
    pub statistics: RunStatistics,
}

/// Number of records in one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: DeviceCategory,
    pub description: String,
    pub count: usize,
}

/// Performance metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Records processed per second.
    pub records_per_second: f64,
    /// Total duration in milliseconds.
    pub total_duration_ms: u64,
}

impl PerformanceMetrics {
    /// Calculate from statistics.
    #[must_use]
    pub fn from_statistics(stats: &RunStatistics) -> Self {
        let records = f64::from(stats.directory_total)
            + f64::from(stats.identity_total)
            + f64::from(stats.device_management_total);
        let records_per_second = if stats.duration_ms > 0 {
            records * 1000.0 / stats.duration_ms as f64
        } else {
            0.0
        };

        Self {
            records_per_second,
            total_duration_ms: stats.duration_ms,
        }
    }
}

impl ReconciliationReport {
    /// Build the report for a snapshot.
    pub fn generate(view: &SnapshotView) -> Self {
        let statistics = view.snapshot().statistics.clone();
        let categories = DeviceCategory::all()
            .iter()
            .map(|category| CategoryCount {
                category: *category,
                description: category.description().to_string(),
                count: view.count(category.collection(), &category.filter()),
            })
            .collect();

        Self {
            run: RunInfo {
                version: view.version(),
                captured_at: view.captured_at(),
                statistics: statistics.clone(),
            },
            categories,
            performance: PerformanceMetrics::from_statistics(&statistics),
        }
    }

    /// Count for one category.
    pub fn count(&self, category: DeviceCategory) -> usize {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map_or(0, |c| c.count)
    }
}
