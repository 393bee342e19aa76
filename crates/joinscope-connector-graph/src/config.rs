//! Graph adapter configuration.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::{GraphError, GraphResult};

/// Microsoft cloud the tenant lives in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphCloudEnvironment {
    /// Global Azure.
    #[default]
    Commercial,
    /// Azure US Government (GCC High / DoD).
    UsGovernment,
    /// Azure China (21Vianet).
    China,
    /// Explicit endpoints, for sovereign clouds and tests.
    Custom {
        login_endpoint: String,
        graph_endpoint: String,
    },
}

impl GraphCloudEnvironment {
    /// Base URL of the token service, without trailing slash.
    #[must_use]
    pub fn login_endpoint(&self) -> &str {
        match self {
            Self::Commercial => "https://login.microsoftonline.com",
            Self::UsGovernment => "https://login.microsoftonline.us",
            Self::China => "https://login.chinacloudapi.cn",
            Self::Custom { login_endpoint, .. } => login_endpoint.trim_end_matches('/'),
        }
    }

    /// Base URL of Microsoft Graph, without trailing slash.
    #[must_use]
    pub fn graph_endpoint(&self) -> &str {
        match self {
            Self::Commercial => "https://graph.microsoft.com",
            Self::UsGovernment => "https://graph.microsoft.us",
            Self::China => "https://microsoftgraph.chinacloudapi.cn",
            Self::Custom { graph_endpoint, .. } => graph_endpoint.trim_end_matches('/'),
        }
    }

    /// Point both endpoints at one base URL (a mock server).
    pub fn custom(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Self::Custom {
            login_endpoint: base.clone(),
            graph_endpoint: base,
        }
    }
}

/// Configuration shared by the Entra ID and Intune sources.
#[derive(Debug, Deserialize)]
pub struct GraphConfig {
    /// Directory (tenant) ID.
    pub tenant_id: String,

    /// Application (client) ID of the app registration.
    pub client_id: String,

    /// Client secret of the app registration.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub client_secret: Option<SecretString>,

    #[serde(default)]
    pub cloud: GraphCloudEnvironment,

    /// Graph API version segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// `$top` page size requested from Graph.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Retries for throttled (429) and transient 5xx responses.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds, doubled per retry.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound for a server-provided Retry-After, in seconds.
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// OData `$filter` for `/devices` (e.g. `operatingSystem eq 'Windows'`).
    #[serde(default)]
    pub device_filter: Option<String>,

    /// OData `$filter` for `/deviceManagement/managedDevices`.
    #[serde(default)]
    pub managed_device_filter: Option<String>,
}

fn default_api_version() -> String {
    "v1.0".to_string()
}

fn default_page_size() -> u32 {
    999
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_max_retry_after_secs() -> u64 {
    120
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()).map(SecretString::from))
}

impl GraphConfig {
    /// Create a config for the commercial cloud.
    pub fn new(tenant_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: None,
            cloud: GraphCloudEnvironment::default(),
            api_version: default_api_version(),
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            max_retry_after_secs: default_max_retry_after_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            device_filter: None,
            managed_device_filter: None,
        }
    }

    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::from(secret.into()));
        self
    }

    #[must_use]
    pub fn with_cloud(mut self, cloud: GraphCloudEnvironment) -> Self {
        self.cloud = cloud;
        self
    }

    #[must_use]
    pub fn with_retry_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_base_delay_ms = delay_ms;
        self
    }

    /// Token endpoint for the client credentials grant.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.cloud.login_endpoint(),
            self.tenant_id
        )
    }

    /// Base URL for Graph requests, including the API version.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}/{}", self.cloud.graph_endpoint(), self.api_version)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] for missing identifiers or secret and
    /// [`GraphError::Url`] for malformed custom endpoints.
    pub fn validate(&self) -> GraphResult<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(GraphError::Config("tenant_id is required".to_string()));
        }
        if self.client_id.trim().is_empty() {
            return Err(GraphError::Config("client_id is required".to_string()));
        }
        if self.client_secret.is_none() {
            return Err(GraphError::Config("client_secret is required".to_string()));
        }
        if self.page_size == 0 || self.page_size > 999 {
            return Err(GraphError::Config(
                "page_size must be between 1 and 999".to_string(),
            ));
        }
        url::Url::parse(self.cloud.login_endpoint())?;
        url::Url::parse(self.cloud.graph_endpoint())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commercial_endpoints() {
        let config = GraphConfig::new("tenant", "client");
        assert_eq!(
            config.token_url(),
            "https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
        );
        assert_eq!(config.base_url(), "https://graph.microsoft.com/v1.0");
    }

    #[test]
    fn test_us_government_endpoints() {
        let env = GraphCloudEnvironment::UsGovernment;
        assert_eq!(env.login_endpoint(), "https://login.microsoftonline.us");
        assert_eq!(env.graph_endpoint(), "https://graph.microsoft.us");
    }

    #[test]
    fn test_custom_endpoint_trims_slash() {
        let env = GraphCloudEnvironment::custom("http://127.0.0.1:8080/");
        assert_eq!(env.graph_endpoint(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_validate() {
        assert!(GraphConfig::new("tenant", "client").validate().is_err());
        assert!(GraphConfig::new("tenant", "client")
            .with_client_secret("s3cret")
            .validate()
            .is_ok());
        assert!(GraphConfig::new("", "client")
            .with_client_secret("s3cret")
            .validate()
            .is_err());

        let bad = GraphConfig::new("tenant", "client")
            .with_client_secret("s3cret")
            .with_cloud(GraphCloudEnvironment::custom("not a url"));
        assert!(matches!(bad.validate(), Err(GraphError::Url(_))));
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = serde_json::json!({
            "tenant_id": "t",
            "client_id": "c",
            "client_secret": "s",
            "cloud": "china",
            "device_filter": "operatingSystem eq 'Windows'"
        });
        let config: GraphConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.cloud, GraphCloudEnvironment::China);
        assert_eq!(config.api_version, "v1.0");
        assert_eq!(config.page_size, 999);
        assert_eq!(config.max_retries, 5);
        assert!(config.client_secret.is_some());
        assert!(!format!("{config:?}").contains("\"s\""));
    }
}
