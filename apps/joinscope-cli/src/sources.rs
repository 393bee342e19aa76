//! Source wiring: live adapters and JSON export files

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use joinscope_connector_ad::AdDeviceSource;
use joinscope_connector_graph::{map_graph_object, EntraDeviceSource, GraphClient, IntuneDeviceSource};
use joinscope_core::{
    DeviceInventorySource, DeviceRecord, DeviceSource, SourceError, SourceResult,
};
use joinscope_reconciliation::InventorySources;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Config, FileSourceConfig};
use crate::error::{CliError, CliResult};

/// Device inventory read from a JSON export.
///
/// Accepts a top-level array or a Graph-style `{"value": [...]}` object.
#[derive(Debug)]
pub struct JsonFileSource {
    source: DeviceSource,
    path: PathBuf,
    name_field: String,
    secondary_id_field: Option<String>,
    display_name: String,
}

impl JsonFileSource {
    pub fn new(source: DeviceSource, file: &FileSourceConfig) -> Self {
        Self {
            source,
            path: file.path.clone(),
            name_field: file.name_field(source).to_string(),
            secondary_id_field: file.secondary_id_field(source).map(str::to_string),
            display_name: format!("{} file: {}", source.label(), file.path.display()),
        }
    }

    async fn read_objects(&self) -> SourceResult<Vec<Value>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SourceError::invalid_configuration(
                self.source,
                format!("cannot read {}: {e}", self.path.display()),
            )
        })?;
        let document: Value = serde_json::from_str(&content).map_err(|e| {
            SourceError::invalid_data(
                self.source,
                format!("{} is not valid JSON: {e}", self.path.display()),
            )
        })?;
        match document {
            Value::Array(items) => Ok(items),
            Value::Object(mut map) => match map.remove("value") {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(SourceError::invalid_data(
                    self.source,
                    format!("{}: expected an array of devices", self.path.display()),
                )),
            },
            _ => Err(SourceError::invalid_data(
                self.source,
                format!("{}: expected an array of devices", self.path.display()),
            )),
        }
    }
}

#[async_trait]
impl DeviceInventorySource for JsonFileSource {
    fn source(&self) -> DeviceSource {
        self.source
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn test_connection(&self) -> SourceResult<()> {
        self.read_objects().await.map(|_| ())
    }

    async fn fetch_devices(&self) -> SourceResult<Vec<DeviceRecord>> {
        let objects = self.read_objects().await?;
        let id_field = self.secondary_id_field.as_deref().unwrap_or("");
        let mut skipped = 0usize;
        let records: Vec<DeviceRecord> = objects
            .iter()
            .filter_map(|object| {
                let record = map_graph_object(self.source, object, &self.name_field, id_field);
                if record.is_none() {
                    skipped += 1;
                }
                record
            })
            .collect();
        if skipped > 0 {
            warn!(path = %self.path.display(), skipped, "Skipped entries without a name");
        }
        info!(
            source = %self.source,
            path = %self.path.display(),
            devices = records.len(),
            "Loaded devices from file"
        );
        Ok(records)
    }
}

/// Build the adapter for every collection from the configuration.
///
/// A configured file wins over the live source for its collection. The
/// identity and device-management adapters share one Graph client.
pub fn build_sources(config: Config) -> CliResult<InventorySources> {
    let Config {
        directory: ad_config,
        graph: graph_config,
        files,
        ..
    } = config;

    let directory: Box<dyn DeviceInventorySource> = match (files.get(DeviceSource::Directory), ad_config) {
        (Some(file), _) => Box::new(file_source(DeviceSource::Directory, file)),
        (None, Some(ad)) => Box::new(
            AdDeviceSource::new(ad).map_err(|e| CliError::Config(format!("directory: {e}")))?,
        ),
        (None, None) => return Err(missing(DeviceSource::Directory)),
    };

    let graph_client = match &graph_config {
        Some(graph) if files.identity.is_none() || files.device_management.is_none() => Some(
            Arc::new(GraphClient::from_config(graph).map_err(|e| CliError::Config(format!("graph: {e}")))?),
        ),
        _ => None,
    };

    let identity: Box<dyn DeviceInventorySource> =
        match (files.get(DeviceSource::IdentityService), &graph_client, &graph_config) {
            (Some(file), _, _) => Box::new(file_source(DeviceSource::IdentityService, file)),
            (None, Some(client), Some(graph)) => {
                Box::new(EntraDeviceSource::with_client(Arc::clone(client), graph))
            }
            _ => return Err(missing(DeviceSource::IdentityService)),
        };

    let device_management: Box<dyn DeviceInventorySource> =
        match (files.get(DeviceSource::DeviceManagement), &graph_client, &graph_config) {
            (Some(file), _, _) => Box::new(file_source(DeviceSource::DeviceManagement, file)),
            (None, Some(client), Some(graph)) => {
                Box::new(IntuneDeviceSource::with_client(Arc::clone(client), graph))
            }
            _ => return Err(missing(DeviceSource::DeviceManagement)),
        };

    Ok(InventorySources::new(directory, identity, device_management))
}

fn file_source(source: DeviceSource, file: &FileSourceConfig) -> JsonFileSource {
    debug!(source = %source, path = %file.path.display(), "Using file source");
    JsonFileSource::new(source, file)
}

fn missing(source: DeviceSource) -> CliError {
    let hint = match source {
        DeviceSource::Directory => "a 'directory' section or files.directory",
        DeviceSource::IdentityService => "a 'graph' section or files.identity",
        DeviceSource::DeviceManagement => "a 'graph' section or files.device_management",
    };
    CliError::Config(format!("No {} source configured: add {hint}", source.label()))
}
