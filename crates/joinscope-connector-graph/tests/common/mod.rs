//! Common test utilities for joinscope-connector-graph integration tests.

#![allow(dead_code)]

use joinscope_connector_graph::{GraphCloudEnvironment, GraphConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT_ID: &str = "test-tenant";

/// Test data factory for an Entra ID device registration.
pub fn create_entra_device(display_name: &str, device_id: &str) -> Value {
    json!({
        "id": format!("obj-{device_id}"),
        "deviceId": device_id,
        "displayName": display_name,
        "operatingSystem": "Windows",
        "operatingSystemVersion": "10.0.19045.4046",
        "trustType": "ServerAd",
        "accountEnabled": true,
        "isManaged": true
    })
}

/// Test data factory for an Intune managed device.
pub fn create_managed_device(device_name: &str, azure_ad_device_id: &str) -> Value {
    json!({
        "id": format!("md-{device_name}"),
        "deviceName": device_name,
        "azureADDeviceId": azure_ad_device_id,
        "operatingSystem": "Windows",
        "complianceState": "compliant",
        "lastSyncDateTime": "2024-03-01T08:00:00Z"
    })
}

/// Wraps items in an OData response format.
pub fn create_odata_response(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut response = json!({ "value": items });
    if let Some(link) = next_link {
        response["@odata.nextLink"] = json!(link);
    }
    response
}

/// Creates an OData error response.
pub fn create_odata_error(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}

/// Creates a mock OAuth token response.
pub fn create_token_response(access_token: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in
    })
}

/// Mock server wrapper with common setup helpers.
pub struct MockGraphServer {
    pub server: MockServer,
}

impl MockGraphServer {
    /// Creates a new mock Graph API server.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Returns the mock server's base URL.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Config pointing both login and Graph endpoints at this server.
    pub fn config(&self) -> GraphConfig {
        GraphConfig::new(TENANT_ID, "test-client")
            .with_client_secret("test-secret")
            .with_cloud(GraphCloudEnvironment::custom(self.url()))
            .with_retry_base_delay_ms(10)
    }

    /// Sets up OAuth token endpoint.
    pub async fn mock_token_endpoint(&self) {
        Mock::given(method("POST"))
            .and(path(format!("/{TENANT_ID}/oauth2/v2.0/token")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(create_token_response("mock-access-token", 3600)),
            )
            .mount(&self.server)
            .await;
    }
}
