//! # joinscope core
//!
//! Shared model for reconciling device inventories across a directory
//! service, a cloud identity service and a device-management service.
//!
//! This crate defines:
//! - [`DeviceRecord`] with its fixed core schema (name, secondary identifier,
//!   presence flags) and a typed pass-through attribute map
//! - [`PresenceFlags`], which only ever accumulate
//! - [`DeviceFilter`], predicate values evaluated against records
//! - [`DeviceInventorySource`], the trait implemented by source adapters
//!
//! ## Example
//!
//! ```
//! use joinscope_core::{DeviceFilter, DeviceRecord, DeviceSource};
//!
//! let record = DeviceRecord::new(DeviceSource::IdentityService, "PC1")
//!     .with_secondary_id("3f2a")
//!     .with_attribute("operatingSystem", "Windows");
//!
//! assert!(record.flags().in_identity_service());
//! assert!(DeviceFilter::eq_ignore_case("operatingSystem", "windows").matches(&record));
//! ```

pub mod attribute;
pub mod error;
pub mod filter;
pub mod record;
pub mod source;
pub mod types;

pub use attribute::{AttributeValue, Attributes};
pub use error::{SourceError, SourceResult};
pub use filter::DeviceFilter;
pub use record::{DeviceRecord, PresenceFlags};
pub use source::DeviceInventorySource;
pub use types::{DeviceSource, ParseDeviceSourceError};
