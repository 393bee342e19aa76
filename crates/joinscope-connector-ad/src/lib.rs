//! Active Directory adapter for joinscope
//!
//! Reads `computer` objects over LDAP and turns them into directory device
//! records. Directory records carry no secondary identifier; they join the
//! identity service by name only.
//!
//! # Example
//!
//! ```no_run
//! use joinscope_connector_ad::{AdConfig, AdDeviceSource, SearchBase};
//! use joinscope_core::DeviceInventorySource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AdConfig::new("dc01.corp.example.com", "DC=corp,DC=example,DC=com", "svc-joinscope@corp.example.com")
//!     .with_password("secret")
//!     .with_search_base(SearchBase::subtree("OU=Workstations,DC=corp,DC=example,DC=com"));
//!
//! let source = AdDeviceSource::new(config)?;
//! let computers = source.fetch_devices().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod connector;
mod error;
mod mapping;

pub use config::{AdConfig, SearchBase};
pub use connector::AdDeviceSource;
pub use error::{AdError, AdResult};
pub use mapping::{filetime_to_datetime, map_computer_entry, parse_generalized_time};
