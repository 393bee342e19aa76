//! Microsoft Graph adapters for joinscope
//!
//! One app registration (client credentials) serves two inventories:
//! Entra ID device registrations for the identity service and Intune
//! managed devices for device management. Both sources can share a
//! [`GraphClient`] so they reuse one token cache.
//!
//! Throttled and transient responses are retried with backoff, honoring
//! `Retry-After` up to a configurable ceiling.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use joinscope_connector_graph::{EntraDeviceSource, GraphClient, GraphConfig, IntuneDeviceSource};
//! use joinscope_core::DeviceInventorySource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GraphConfig::new("contoso-tenant-id", "app-client-id").with_client_secret("secret");
//! let client = Arc::new(GraphClient::from_config(&config)?);
//!
//! let entra = EntraDeviceSource::with_client(Arc::clone(&client), &config);
//! let intune = IntuneDeviceSource::with_client(client, &config);
//! let registered = entra.fetch_devices().await?;
//! let managed = intune.fetch_devices().await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod devices;
mod error;

pub use auth::TokenCache;
pub use client::{GraphClient, ODataError, ODataErrorBody, ODataQuery, ODataResponse};
pub use config::{GraphCloudEnvironment, GraphConfig};
pub use devices::{
    map_graph_object, EntraDeviceSource, IntuneDeviceSource, DEVICE_SELECT, MANAGED_DEVICE_SELECT,
};
pub use error::{GraphError, GraphResult};
