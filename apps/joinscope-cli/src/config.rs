//! CLI configuration: file locations, YAML settings and secret overrides

use std::path::{Path, PathBuf};

use joinscope_connector_ad::AdConfig;
use joinscope_connector_graph::GraphConfig;
use joinscope_core::{DeviceFilter, DeviceSource};
use joinscope_reconciliation::{NameMatching, ReconciliationConfig};
use serde::Deserialize;

use crate::error::{CliError, CliResult};

/// Overrides the platform configuration directory.
pub const CONFIG_DIR_ENV: &str = "JOINSCOPE_CONFIG_DIR";
/// Directory bind password, kept out of the YAML file.
pub const AD_PASSWORD_ENV: &str = "JOINSCOPE_AD_BIND_PASSWORD";
/// App registration secret, kept out of the YAML file.
pub const GRAPH_SECRET_ENV: &str = "JOINSCOPE_GRAPH_CLIENT_SECRET";

/// Configuration paths for the joinscope CLI
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Path to config.yaml
    pub config_file: PathBuf,
    /// Path to the cached snapshot
    pub snapshot_file: PathBuf,
}

impl ConfigPaths {
    /// Resolve paths from the process environment.
    ///
    /// Paths:
    /// - Linux: ~/.config/joinscope/
    /// - macOS: ~/Library/Application Support/joinscope/
    /// - Windows: %APPDATA%\joinscope\
    pub fn new(config_file: Option<&Path>) -> CliResult<Self> {
        Self::resolve(config_file, |key| std::env::var(key).ok())
    }

    /// Resolve paths with an explicit environment reader.
    ///
    /// An explicit config file keeps its snapshot next to it.
    pub fn resolve<F>(config_file: Option<&Path>, env: F) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(file) = config_file {
            let config_dir = file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            return Ok(Self {
                snapshot_file: config_dir.join("snapshot.json"),
                config_file: file.to_path_buf(),
            });
        }

        let config_dir = match env(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| {
                    CliError::Config("Could not determine configuration directory".to_string())
                })?
                .join("joinscope"),
        };

        Ok(Self {
            config_file: config_dir.join("config.yaml"),
            snapshot_file: config_dir.join("snapshot.json"),
        })
    }
}

/// A JSON export standing in for a live source.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSourceConfig {
    pub path: PathBuf,
    /// Field holding the device name; defaults per source.
    #[serde(default)]
    pub name_field: Option<String>,
    /// Field holding the identity-service device ID; defaults per source.
    #[serde(default)]
    pub secondary_id_field: Option<String>,
}

impl FileSourceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name_field: None,
            secondary_id_field: None,
        }
    }

    /// Name field, falling back to the field the live source uses.
    pub fn name_field(&self, source: DeviceSource) -> &str {
        self.name_field.as_deref().unwrap_or(match source {
            DeviceSource::Directory => "name",
            DeviceSource::IdentityService => "displayName",
            DeviceSource::DeviceManagement => "deviceName",
        })
    }

    /// Secondary id field; directory exports have none unless configured.
    pub fn secondary_id_field(&self, source: DeviceSource) -> Option<&str> {
        self.secondary_id_field.as_deref().or(match source {
            DeviceSource::Directory => None,
            DeviceSource::IdentityService => Some("deviceId"),
            DeviceSource::DeviceManagement => Some("azureADDeviceId"),
        })
    }
}

/// File sources, one optional export per collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileSources {
    #[serde(default)]
    pub directory: Option<FileSourceConfig>,
    #[serde(default)]
    pub identity: Option<FileSourceConfig>,
    #[serde(default)]
    pub device_management: Option<FileSourceConfig>,
}

impl FileSources {
    pub fn get(&self, source: DeviceSource) -> Option<&FileSourceConfig> {
        match source {
            DeviceSource::Directory => self.directory.as_ref(),
            DeviceSource::IdentityService => self.identity.as_ref(),
            DeviceSource::DeviceManagement => self.device_management.as_ref(),
        }
    }

    pub fn set(&mut self, source: DeviceSource, file: FileSourceConfig) {
        match source {
            DeviceSource::Directory => self.directory = Some(file),
            DeviceSource::IdentityService => self.identity = Some(file),
            DeviceSource::DeviceManagement => self.device_management = Some(file),
        }
    }
}

/// Join settings as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationSettings {
    #[serde(default = "default_ignore_case")]
    pub ignore_case: bool,
    #[serde(default = "default_trim_whitespace")]
    pub trim_whitespace: bool,
    #[serde(default)]
    pub trim_dns_suffix: bool,
    #[serde(default = "default_os_filter")]
    pub identity_filter: DeviceFilter,
    #[serde(default = "default_os_filter")]
    pub device_management_filter: DeviceFilter,
}

fn default_ignore_case() -> bool {
    true
}

fn default_trim_whitespace() -> bool {
    true
}

/// Only Windows devices take part in the joins unless configured otherwise.
fn default_os_filter() -> DeviceFilter {
    DeviceFilter::eq_ignore_case("operatingSystem", "Windows")
}

impl Default for ReconciliationSettings {
    fn default() -> Self {
        Self {
            ignore_case: default_ignore_case(),
            trim_whitespace: default_trim_whitespace(),
            trim_dns_suffix: false,
            identity_filter: default_os_filter(),
            device_management_filter: default_os_filter(),
        }
    }
}

impl ReconciliationSettings {
    pub fn to_engine_config(&self) -> ReconciliationConfig {
        ReconciliationConfig::default()
            .with_name_matching(NameMatching {
                ignore_case: self.ignore_case,
                trim_whitespace: self.trim_whitespace,
                trim_dns_suffix: self.trim_dns_suffix,
            })
            .with_identity_filter(self.identity_filter.clone())
            .with_device_management_filter(self.device_management_filter.clone())
    }
}

/// CLI configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Live directory source.
    #[serde(default)]
    pub directory: Option<AdConfig>,

    /// Live identity and device-management sources.
    #[serde(default)]
    pub graph: Option<GraphConfig>,

    /// JSON exports; a file source wins over the live source for its collection.
    #[serde(default)]
    pub files: FileSources,

    #[serde(default)]
    pub reconciliation: ReconciliationSettings,

    /// `status` warns when the cached snapshot is older than this.
    #[serde(default = "default_max_snapshot_age_hours")]
    pub max_snapshot_age_hours: u64,

    /// Where the snapshot cache lives; defaults to the config directory.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

fn default_max_snapshot_age_hours() -> u64 {
    24
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: None,
            graph: None,
            files: FileSources::default(),
            reconciliation: ReconciliationSettings::default(),
            max_snapshot_age_hours: default_max_snapshot_age_hours(),
            snapshot_path: None,
        }
    }
}

impl Config {
    /// Load from disk and apply secret overrides from the environment.
    ///
    /// A missing config file yields the defaults.
    pub fn load(paths: &ConfigPaths) -> CliResult<Self> {
        Self::load_with_env(paths, |key| std::env::var(key).ok())
    }

    pub fn load_with_env<F>(paths: &ConfigPaths, env: F) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = if paths.config_file.exists() {
            let content = std::fs::read_to_string(&paths.config_file).map_err(|e| {
                CliError::Config(format!(
                    "Cannot read {}: {e}",
                    paths.config_file.display()
                ))
            })?;
            Self::from_yaml(&content)?
        } else {
            tracing::debug!(path = %paths.config_file.display(), "No config file, using defaults");
            Self::default()
        };
        Ok(config.with_env_overrides(env))
    }

    pub fn from_yaml(content: &str) -> CliResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply secrets supplied through the environment.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = env(AD_PASSWORD_ENV).filter(|v| !v.is_empty()) {
            self.directory = self.directory.map(|ad| ad.with_password(password));
        }
        if let Some(secret) = env(GRAPH_SECRET_ENV).filter(|v| !v.is_empty()) {
            self.graph = self.graph.map(|graph| graph.with_client_secret(secret));
        }
        self
    }

    /// Snapshot cache location.
    pub fn snapshot_file(&self, paths: &ConfigPaths) -> PathBuf {
        self.snapshot_path
            .clone()
            .unwrap_or_else(|| paths.snapshot_file.clone())
    }
}
