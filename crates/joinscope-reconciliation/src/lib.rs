//! # joinscope reconciliation
//!
//! Cross-references a directory, an identity service and a device-management
//! service and derives the broken subset of identity records.
//!
//! A pass runs in four steps over one point-in-time capture:
//!
//! 1. [`Annotator`] resets every record to home-only presence
//! 2. [`CrossReferencer`] joins directory to identity by name and identity to
//!    device management by secondary identifier
//! 3. [`DuplicateResolver`] keeps the identity name groups with no managed
//!    member
//! 4. the result is published to the [`SnapshotStore`]
//!
//! ## Example
//!
//! ```
//! use joinscope_core::{DeviceRecord, DeviceSource};
//! use joinscope_reconciliation::{
//!     DeviceCollections, ReconciliationConfig, ReconciliationEngine,
//! };
//!
//! let engine = ReconciliationEngine::new(ReconciliationConfig::default());
//! let outcome = engine
//!     .reconcile(DeviceCollections::new(
//!         vec![DeviceRecord::new(DeviceSource::Directory, "PC1")],
//!         vec![DeviceRecord::new(DeviceSource::IdentityService, "PC1").with_secondary_id("X")],
//!         vec![DeviceRecord::new(DeviceSource::DeviceManagement, "PC1").with_secondary_id("X")],
//!     ))
//!     .unwrap();
//!
//! assert!(outcome.snapshot.broken.is_empty());
//! assert!(engine.view().unwrap().lookup_by_name("pc1").in_device_management);
//! ```

pub mod annotator;
pub mod category;
pub mod config;
pub mod cross_reference;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod query;
pub mod report;
pub mod snapshot;
pub mod statistics;

pub use annotator::{Annotator, DeviceCollections};
pub use category::DeviceCategory;
pub use config::{NameMatching, ReconciliationConfig};
pub use cross_reference::{CrossReferencer, Participation};
pub use duplicates::DuplicateResolver;
pub use engine::{InventorySources, ReconciliationEngine, ReconciliationOutcome};
pub use error::{ReconciliationError, ReconciliationResult};
pub use query::{Collection, PresenceReport, SnapshotView};
pub use report::{CategoryCount, PerformanceMetrics, ReconciliationReport, RunInfo};
pub use snapshot::{Snapshot, SnapshotState, SnapshotStore};
pub use statistics::{RunStatistics, StatisticsTracker};
