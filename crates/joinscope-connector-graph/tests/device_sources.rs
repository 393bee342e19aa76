//! Entra ID and Intune sources against a mocked Graph endpoint.

mod common;

use std::sync::Arc;

use common::*;
use joinscope_connector_graph::{EntraDeviceSource, GraphClient, IntuneDeviceSource};
use joinscope_core::{DeviceInventorySource, DeviceSource, SourceError};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_entra_devices_follow_next_link() {
    let mock = MockGraphServer::new().await;
    mock.mock_token_endpoint().await;

    let next = format!("{}/v1.0/devices?$skiptoken=page2", mock.url());
    Mock::given(method("GET"))
        .and(path("/v1.0/devices"))
        .and(query_param_is_missing("$skiptoken"))
        .and(header("authorization", "Bearer mock-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_odata_response(
            vec![
                create_entra_device("WS-001", "11111111-1111-1111-1111-111111111111"),
                create_entra_device("WS-002", "22222222-2222-2222-2222-222222222222"),
            ],
            Some(&next),
        )))
        .expect(1)
        .mount(&mock.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/devices"))
        .and(query_param("$skiptoken", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_odata_response(
            vec![create_entra_device("WS-003", "33333333-3333-3333-3333-333333333333")],
            None,
        )))
        .expect(1)
        .mount(&mock.server)
        .await;

    let source = EntraDeviceSource::new(&mock.config()).unwrap();
    let devices = source.fetch_devices().await.unwrap();

    let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["WS-001", "WS-002", "WS-003"]);
    assert!(devices
        .iter()
        .all(|d| d.origin() == DeviceSource::IdentityService));
    assert_eq!(
        devices[2].secondary_id(),
        Some("33333333-3333-3333-3333-333333333333")
    );
    assert_eq!(
        devices[0].attributes.get_string("operatingSystem"),
        Some("Windows")
    );
}

#[tokio::test]
async fn test_device_filter_is_sent() {
    let mock = MockGraphServer::new().await;
    mock.mock_token_endpoint().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/devices"))
        .and(query_param("$filter", "operatingSystem eq 'Windows'"))
        .and(query_param("$top", "999"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(create_odata_response(vec![], None)),
        )
        .expect(1)
        .mount(&mock.server)
        .await;

    let mut config = mock.config();
    config.device_filter = Some("operatingSystem eq 'Windows'".to_string());
    let source = EntraDeviceSource::new(&config).unwrap();

    assert!(source.fetch_devices().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_intune_zero_guid_has_no_secondary_id() {
    let mock = MockGraphServer::new().await;
    mock.mock_token_endpoint().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/deviceManagement/managedDevices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_odata_response(
            vec![
                create_managed_device("WS-001", "11111111-1111-1111-1111-111111111111"),
                create_managed_device("KIOSK-7", "00000000-0000-0000-0000-000000000000"),
            ],
            None,
        )))
        .mount(&mock.server)
        .await;

    let source = IntuneDeviceSource::new(&mock.config()).unwrap();
    let devices = source.fetch_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].origin(), DeviceSource::DeviceManagement);
    assert_eq!(
        devices[0].secondary_id(),
        Some("11111111-1111-1111-1111-111111111111")
    );
    assert_eq!(devices[1].secondary_id(), None);
    assert_eq!(
        devices[1].attributes.get_string("complianceState"),
        Some("compliant")
    );
}

#[tokio::test]
async fn test_throttled_request_is_retried() {
    let mock = MockGraphServer::new().await;
    mock.mock_token_endpoint().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/devices"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_odata_response(
            vec![create_entra_device("WS-001", "11111111-1111-1111-1111-111111111111")],
            None,
        )))
        .expect(1)
        .mount(&mock.server)
        .await;

    let source = EntraDeviceSource::new(&mock.config()).unwrap();
    let devices = source.fetch_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
}

#[tokio::test]
async fn test_persistent_throttling_is_unavailable() {
    let mock = MockGraphServer::new().await;
    mock.mock_token_endpoint().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/deviceManagement/managedDevices"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock.server)
        .await;

    let mut config = mock.config();
    config.max_retries = 2;
    let source = IntuneDeviceSource::new(&config).unwrap();

    let err = source.fetch_devices().await.unwrap_err();
    assert!(matches!(err, SourceError::Unavailable { .. }));
    assert!(err.is_transient());
    assert_eq!(err.source_kind(), DeviceSource::DeviceManagement);
}

#[tokio::test]
async fn test_forbidden_is_permission_denied() {
    let mock = MockGraphServer::new().await;
    mock.mock_token_endpoint().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/deviceManagement/managedDevices"))
        .respond_with(ResponseTemplate::new(403).set_body_json(create_odata_error(
            "Forbidden",
            "Application is not authorized to perform this operation",
        )))
        .mount(&mock.server)
        .await;

    let source = IntuneDeviceSource::new(&mock.config()).unwrap();
    let err = source.fetch_devices().await.unwrap_err();

    assert!(matches!(err, SourceError::PermissionDenied { .. }));
    assert!(!err.is_transient());
    assert!(err.to_string().contains("not authorized"));
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_once() {
    let mock = MockGraphServer::new().await;

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT_ID}/oauth2/v2.0/token")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(create_token_response("mock-access-token", 3600)),
        )
        .expect(2)
        .mount(&mock.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/devices"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&mock.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/devices"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(create_odata_response(vec![], None)),
        )
        .mount(&mock.server)
        .await;

    let source = EntraDeviceSource::new(&mock.config()).unwrap();
    assert!(source.fetch_devices().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_token_failure_is_authentication_error() {
    let mock = MockGraphServer::new().await;

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT_ID}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .mount(&mock.server)
        .await;

    let source = EntraDeviceSource::new(&mock.config()).unwrap();
    let err = source.test_connection().await.unwrap_err();
    assert!(matches!(err, SourceError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn test_sources_share_one_token() {
    let mock = MockGraphServer::new().await;

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT_ID}/oauth2/v2.0/token")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(create_token_response("mock-access-token", 3600)),
        )
        .expect(1)
        .mount(&mock.server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("$top", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(create_odata_response(vec![], None)),
        )
        .expect(2)
        .mount(&mock.server)
        .await;

    let config = mock.config();
    let client = Arc::new(GraphClient::from_config(&config).unwrap());
    let entra = EntraDeviceSource::with_client(Arc::clone(&client), &config);
    let intune = IntuneDeviceSource::with_client(client, &config);

    entra.test_connection().await.unwrap();
    intune.test_connection().await.unwrap();
    assert_eq!(intune.display_name(), format!("Intune: {TENANT_ID}"));
}
