//! Identity service (Entra ID) and device management (Intune) sources.

use std::sync::Arc;

use async_trait::async_trait;
use joinscope_core::{Attributes, DeviceInventorySource, DeviceRecord, DeviceSource, SourceResult};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::client::{GraphClient, ODataQuery};
use crate::config::GraphConfig;
use crate::GraphResult;

/// Fields requested from `/devices`.
pub const DEVICE_SELECT: &[&str] = &[
    "id",
    "deviceId",
    "displayName",
    "operatingSystem",
    "operatingSystemVersion",
    "trustType",
    "accountEnabled",
    "approximateLastSignInDateTime",
    "isManaged",
    "isCompliant",
    "registrationDateTime",
    "profileType",
];

/// Fields requested from `/deviceManagement/managedDevices`.
pub const MANAGED_DEVICE_SELECT: &[&str] = &[
    "id",
    "deviceName",
    "azureADDeviceId",
    "operatingSystem",
    "osVersion",
    "complianceState",
    "managementAgent",
    "managedDeviceOwnerType",
    "enrolledDateTime",
    "lastSyncDateTime",
    "userPrincipalName",
    "serialNumber",
    "model",
    "manufacturer",
];

/// Intune reports devices that never registered with this placeholder.
const EMPTY_DEVICE_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Map one Graph object to a device record.
///
/// Returns `None` when the object has no usable name. The name and
/// secondary id fields are not repeated as attributes.
pub fn map_graph_object(
    source: DeviceSource,
    object: &Value,
    name_field: &str,
    id_field: &str,
) -> Option<DeviceRecord> {
    let map = object.as_object()?;
    let name = map
        .get(name_field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())?;

    let mut record = DeviceRecord::new(source, name)
        .with_attributes(Attributes::from_json_object(map, &[name_field, id_field]));

    let secondary_id = map
        .get(id_field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty() && *id != EMPTY_DEVICE_ID);
    if let Some(id) = secondary_id {
        record = record.with_secondary_id(id);
    }
    Some(record)
}

fn map_page(source: DeviceSource, objects: &[Value], name_field: &str, id_field: &str) -> Vec<DeviceRecord> {
    let mut skipped = 0usize;
    let records: Vec<DeviceRecord> = objects
        .iter()
        .filter_map(|object| {
            let record = map_graph_object(source, object, name_field, id_field);
            if record.is_none() {
                skipped += 1;
            }
            record
        })
        .collect();
    if skipped > 0 {
        warn!(source = %source, skipped, "Skipped devices without a name");
    }
    records
}

/// Entra ID device registrations from `/devices`.
#[derive(Debug)]
pub struct EntraDeviceSource {
    client: Arc<GraphClient>,
    filter: Option<String>,
    display_name: String,
}

impl EntraDeviceSource {
    /// Build a source with its own client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &GraphConfig) -> GraphResult<Self> {
        let client = Arc::new(GraphClient::from_config(config)?);
        Ok(Self::with_client(client, config))
    }

    /// Build a source sharing an existing client.
    pub fn with_client(client: Arc<GraphClient>, config: &GraphConfig) -> Self {
        Self {
            client,
            filter: config.device_filter.clone(),
            display_name: format!("Entra ID: {}", config.tenant_id),
        }
    }

    async fn fetch(&self) -> GraphResult<Vec<DeviceRecord>> {
        let url = self.client.url(
            "devices",
            &ODataQuery {
                select: DEVICE_SELECT,
                filter: self.filter.as_deref(),
                top: Some(self.client.page_size()),
            },
        );
        let objects: Vec<Value> = self.client.get_paginated(&url).await?;
        let records = map_page(DeviceSource::IdentityService, &objects, "displayName", "deviceId");
        info!(devices = records.len(), "Identity service inventory fetched");
        Ok(records)
    }

    async fn probe(&self) -> GraphResult<()> {
        let url = self.client.url(
            "devices",
            &ODataQuery {
                select: &["id"],
                filter: None,
                top: Some(1),
            },
        );
        let _: Value = self.client.get(&url).await?;
        Ok(())
    }
}

#[async_trait]
impl DeviceInventorySource for EntraDeviceSource {
    fn source(&self) -> DeviceSource {
        DeviceSource::IdentityService
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self))]
    async fn test_connection(&self) -> SourceResult<()> {
        self.probe()
            .await
            .map_err(|e| e.into_source_error(DeviceSource::IdentityService))?;
        info!("Identity service connection test successful");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_devices(&self) -> SourceResult<Vec<DeviceRecord>> {
        self.fetch()
            .await
            .map_err(|e| e.into_source_error(DeviceSource::IdentityService))
    }
}

/// Intune managed devices from `/deviceManagement/managedDevices`.
#[derive(Debug)]
pub struct IntuneDeviceSource {
    client: Arc<GraphClient>,
    filter: Option<String>,
    display_name: String,
}

impl IntuneDeviceSource {
    /// Build a source with its own client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &GraphConfig) -> GraphResult<Self> {
        let client = Arc::new(GraphClient::from_config(config)?);
        Ok(Self::with_client(client, config))
    }

    /// Build a source sharing an existing client.
    pub fn with_client(client: Arc<GraphClient>, config: &GraphConfig) -> Self {
        Self {
            client,
            filter: config.managed_device_filter.clone(),
            display_name: format!("Intune: {}", config.tenant_id),
        }
    }

    async fn fetch(&self) -> GraphResult<Vec<DeviceRecord>> {
        let url = self.client.url(
            "deviceManagement/managedDevices",
            &ODataQuery {
                select: MANAGED_DEVICE_SELECT,
                filter: self.filter.as_deref(),
                top: Some(self.client.page_size()),
            },
        );
        let objects: Vec<Value> = self.client.get_paginated(&url).await?;
        let records = map_page(
            DeviceSource::DeviceManagement,
            &objects,
            "deviceName",
            "azureADDeviceId",
        );
        let unregistered = records.iter().filter(|r| r.secondary_id().is_none()).count();
        info!(
            devices = records.len(),
            unregistered,
            "Device management inventory fetched"
        );
        Ok(records)
    }

    async fn probe(&self) -> GraphResult<()> {
        let url = self.client.url(
            "deviceManagement/managedDevices",
            &ODataQuery {
                select: &["id"],
                filter: None,
                top: Some(1),
            },
        );
        let _: Value = self.client.get(&url).await?;
        Ok(())
    }
}

#[async_trait]
impl DeviceInventorySource for IntuneDeviceSource {
    fn source(&self) -> DeviceSource {
        DeviceSource::DeviceManagement
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self))]
    async fn test_connection(&self) -> SourceResult<()> {
        self.probe()
            .await
            .map_err(|e| e.into_source_error(DeviceSource::DeviceManagement))?;
        info!("Device management connection test successful");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_devices(&self) -> SourceResult<Vec<DeviceRecord>> {
        self.fetch()
            .await
            .map_err(|e| e.into_source_error(DeviceSource::DeviceManagement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinscope_core::AttributeValue;
    use serde_json::json;

    #[test]
    fn test_map_entra_device() {
        let object = json!({
            "id": "obj-1",
            "deviceId": "6f1c2a4e-0000-4000-8000-000000000001",
            "displayName": "WS-001",
            "operatingSystem": "Windows",
            "trustType": "ServerAd",
            "accountEnabled": true,
            "approximateLastSignInDateTime": "2024-03-01T08:00:00Z"
        });
        let record =
            map_graph_object(DeviceSource::IdentityService, &object, "displayName", "deviceId").unwrap();

        assert_eq!(record.name, "WS-001");
        assert_eq!(record.secondary_id(), Some("6f1c2a4e-0000-4000-8000-000000000001"));
        assert_eq!(record.origin(), DeviceSource::IdentityService);
        assert!(!record.attributes.has("displayName"));
        assert!(!record.attributes.has("deviceId"));
        assert_eq!(record.attributes.get_string("trustType"), Some("ServerAd"));
        assert_eq!(
            record.attributes.get("accountEnabled"),
            Some(&AttributeValue::Boolean(true))
        );
        assert!(record
            .attributes
            .get("approximateLastSignInDateTime")
            .and_then(AttributeValue::as_timestamp)
            .is_some());
    }

    #[test]
    fn test_zero_guid_is_absent() {
        let object = json!({
            "deviceName": "KIOSK-7",
            "azureADDeviceId": EMPTY_DEVICE_ID
        });
        let record = map_graph_object(
            DeviceSource::DeviceManagement,
            &object,
            "deviceName",
            "azureADDeviceId",
        )
        .unwrap();
        assert_eq!(record.secondary_id(), None);
    }

    #[test]
    fn test_nameless_object_is_skipped() {
        let objects = vec![
            json!({"displayName": "  ", "deviceId": "a"}),
            json!({"deviceId": "b"}),
            json!("not an object"),
            json!({"displayName": "WS-9"}),
        ];
        let records = map_page(DeviceSource::IdentityService, &objects, "displayName", "deviceId");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "WS-9");
    }
}
