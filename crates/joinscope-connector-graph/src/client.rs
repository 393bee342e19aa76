//! Microsoft Graph HTTP client with pagination and retry handling.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::auth::TokenCache;
use crate::config::GraphConfig;
use crate::{GraphError, GraphResult};

/// `OData` error response from Microsoft Graph.
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

/// `OData` error body.
#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
}

/// Response wrapper for paginated Graph API responses.
#[derive(Debug, Deserialize)]
pub struct ODataResponse<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Query options appended to a collection request.
#[derive(Debug, Clone, Default)]
pub struct ODataQuery<'a> {
    pub select: &'a [&'a str],
    pub filter: Option<&'a str>,
    pub top: Option<u32>,
}

impl ODataQuery<'_> {
    /// Encode as a query string, without the leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();
        if !self.select.is_empty() {
            params.push(format!(
                "$select={}",
                urlencoding::encode(&self.select.join(","))
            ));
        }
        if let Some(filter) = self.filter.filter(|f| !f.trim().is_empty()) {
            params.push(format!("$filter={}", urlencoding::encode(filter)));
        }
        if let Some(top) = self.top {
            params.push(format!("$top={top}"));
        }
        params.join("&")
    }
}

/// Microsoft Graph API client.
#[derive(Debug)]
pub struct GraphClient {
    http_client: reqwest::Client,
    token_cache: TokenCache,
    base_url: String,
    page_size: u32,
    max_retries: u32,
    retry_base_delay: Duration,
    max_retry_after: Duration,
}

impl GraphClient {
    /// Creates a client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn from_config(config: &GraphConfig) -> GraphResult<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GraphError::Config(format!("Failed to create HTTP client: {e}")))?;

        let token_cache = TokenCache::new(config, http_client.clone())?;

        Ok(Self {
            http_client,
            token_cache,
            base_url: config.base_url(),
            page_size: config.page_size,
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_retry_after: Duration::from_secs(config.max_retry_after_secs),
        })
    }

    /// Returns the base URL for Graph API requests.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Absolute URL for a resource path and query.
    #[must_use]
    pub fn url(&self, resource: &str, query: &ODataQuery<'_>) -> String {
        let query = query.to_query_string();
        let resource = resource.trim_start_matches('/');
        if query.is_empty() {
            format!("{}/{resource}", self.base_url)
        } else {
            format!("{}/{resource}?{query}", self.base_url)
        }
    }

    /// Performs a GET request with token injection and retry handling.
    ///
    /// Throttled (429) and transient 5xx responses are retried up to
    /// `max_retries` times. A 401 drops the cached token and retries once.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> GraphResult<T> {
        let mut attempts = 0u32;
        let mut delay = self.retry_base_delay;
        let mut reauthenticated = false;

        loop {
            let token = self.token_cache.get_token().await?;
            let response = self
                .http_client
                .get(url)
                .bearer_auth(&token)
                .header("ConsistencyLevel", "eventual")
                .send()
                .await?;
            let status = response.status();

            if status.is_success() {
                return response.json().await.map_err(GraphError::from);
            }

            if status == reqwest::StatusCode::UNAUTHORIZED && !reauthenticated {
                debug!("Access token rejected, refreshing");
                self.token_cache.invalidate().await;
                reauthenticated = true;
                continue;
            }

            let retryable = status == reqwest::StatusCode::TOO_MANY_REQUESTS
                || matches!(
                    status,
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR
                        | reqwest::StatusCode::BAD_GATEWAY
                        | reqwest::StatusCode::SERVICE_UNAVAILABLE
                        | reqwest::StatusCode::GATEWAY_TIMEOUT
                );

            if retryable {
                if attempts >= self.max_retries {
                    return Err(GraphError::MaxRetriesExceeded {
                        attempts,
                        status: status.as_u16(),
                    });
                }
                attempts += 1;

                let wait = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after)
                    .map_or(delay, |d| d.min(self.max_retry_after));

                warn!(
                    status = status.as_u16(),
                    attempt = attempts,
                    max_retries = self.max_retries,
                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    "Graph request throttled or failed, retrying"
                );
                tokio::time::sleep(wait).await;
                delay = delay.saturating_mul(2);
                continue;
            }

            let error_body = response.text().await.unwrap_or_default();
            if let Ok(odata_error) = serde_json::from_str::<ODataError>(&error_body) {
                return Err(GraphError::GraphApi {
                    status: status.as_u16(),
                    code: odata_error.error.code,
                    message: odata_error.error.message,
                });
            }

            return Err(GraphError::GraphApi {
                status: status.as_u16(),
                code: status.to_string(),
                message: error_body,
            });
        }
    }

    /// Fetches every page of a collection, following `@odata.nextLink`.
    #[instrument(skip(self))]
    pub async fn get_paginated<T: DeserializeOwned>(&self, initial_url: &str) -> GraphResult<Vec<T>> {
        let mut url = initial_url.to_string();
        let mut items = Vec::new();
        let mut pages = 0usize;

        loop {
            debug!(url = %url, "Fetching page");
            let response: ODataResponse<T> = self.get(&url).await?;
            pages += 1;
            items.extend(response.value);

            match response.next_link {
                Some(next) => url = next,
                None => {
                    debug!(pages, items = items.len(), "Pagination complete");
                    return Ok(items);
                }
            }
        }
    }
}

/// Parse a `Retry-After` header given in delta seconds.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odata_error_parsing() {
        let json = r#"{
            "error": {
                "code": "Request_ResourceNotFound",
                "message": "Resource not found",
                "innerError": {"date": "2024-01-15"}
            }
        }"#;

        let error: ODataError = serde_json::from_str(json).unwrap();
        assert_eq!(error.error.code, "Request_ResourceNotFound");
        assert_eq!(error.error.message, "Resource not found");
    }

    #[test]
    fn test_odata_response_parsing() {
        let json = r#"{
            "value": [{"id": "1"}, {"id": "2"}],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/devices?$skiptoken=xxx"
        }"#;

        let response: ODataResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(response.value.len(), 2);
        assert!(response.next_link.is_some());
    }

    #[test]
    fn test_query_string_encoding() {
        let query = ODataQuery {
            select: &["id", "displayName"],
            filter: Some("operatingSystem eq 'Windows'"),
            top: Some(999),
        };
        assert_eq!(
            query.to_query_string(),
            "$select=id%2CdisplayName&$filter=operatingSystem%20eq%20%27Windows%27&$top=999"
        );
    }

    #[test]
    fn test_blank_filter_is_omitted() {
        let query = ODataQuery {
            select: &[],
            filter: Some("  "),
            top: Some(1),
        };
        assert_eq!(query.to_query_string(), "$top=1");
    }

    #[test]
    fn test_url_joins_base() {
        let config = GraphConfig::new("tenant", "client").with_client_secret("s");
        let client = GraphClient::from_config(&config).unwrap();
        assert_eq!(
            client.url("/devices", &ODataQuery::default()),
            "https://graph.microsoft.com/v1.0/devices"
        );
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
