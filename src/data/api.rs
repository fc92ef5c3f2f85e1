//! Locations API client
//!
//! Fetches arcade locations inside a bounding box from the DDR Finder HTTP API
//! and maps the server's numeric error codes onto [`ApiError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::{LocationRecord, QueryBox, SourceRecord};
use crate::config::ApiConfig;

/// Protocol version sent with every request
pub const API_VERSION: u32 = 4;

/// User agent for API requests
const USER_AGENT_VALUE: &str = concat!("ddrfinder/", env!("CARGO_PKG_VERSION"));

/// Server error codes
pub const ERROR_CLIENT_VERSION: i64 = 1;
pub const ERROR_OVERSIZED_BOX: i64 = 20;
pub const ERROR_NO_RESULTS: i64 = 21;
pub const ERROR_DATA_SOURCE: i64 = 22;

/// Errors that can occur when requesting locations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The query was valid but nothing lies inside the box
    #[error("no locations found in this area")]
    NoResults,

    /// The box is larger than the server allows
    #[error("requested area is too large")]
    OversizedBox,

    /// The server does not know the data source
    #[error("unknown data source: '{data_source}'")]
    UnknownDataSource { data_source: String },

    /// The server no longer supports this client's protocol version
    #[error("client protocol version is not supported by the server")]
    ClientVersionMismatch,

    /// Network failure, timeout, malformed payload or unrecognized error code
    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl ApiError {
    /// Maps a server error code to an error
    pub fn from_code(code: i64, message: &str, data_source: &str) -> Self {
        match code {
            ERROR_CLIENT_VERSION => Self::ClientVersionMismatch,
            ERROR_OVERSIZED_BOX => Self::OversizedBox,
            ERROR_NO_RESULTS => Self::NoResults,
            ERROR_DATA_SOURCE => Self::UnknownDataSource {
                data_source: data_source.to_string(),
            },
            _ => Self::Unexpected {
                message: format!("server error {}: {}", code, message),
            },
        }
    }

    /// The server error code for this error (0 for unexpected errors)
    pub fn code(&self) -> i64 {
        match self {
            Self::ClientVersionMismatch => ERROR_CLIENT_VERSION,
            Self::OversizedBox => ERROR_OVERSIZED_BOX,
            Self::NoResults => ERROR_NO_RESULTS,
            Self::UnknownDataSource { .. } => ERROR_DATA_SOURCE,
            Self::Unexpected { .. } => 0,
        }
    }

    /// Whether the error is informational rather than a failure
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::NoResults)
    }

    /// Message suitable for showing in the status line
    pub fn user_message(&self) -> String {
        match self {
            Self::NoResults => "No arcades in this area".to_string(),
            Self::OversizedBox => "Zoom in to load arcades".to_string(),
            Self::UnknownDataSource { data_source } => {
                format!("Data source '{}' is not available", data_source)
            }
            Self::ClientVersionMismatch => {
                "This version of ddrfinder is no longer supported, please update".to_string()
            }
            Self::Unexpected { .. } => "Could not load arcades, press r to retry".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unexpected {
            message: err.to_string(),
        }
    }
}

/// Parsed payload of a successful fetch
#[derive(Debug, Clone, Default)]
pub struct FetchedPayload {
    pub sources: Vec<SourceRecord>,
    pub locations: Vec<LocationRecord>,
}

/// Performs the network request for one query box
#[async_trait]
pub trait NetworkFetcher: Send + Sync {
    async fn fetch(&self, query: &QueryBox) -> Result<FetchedPayload, ApiError>;
}

/// Success body returned by the locations endpoint
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    sources: Vec<SourceRecord>,
    locations: Vec<LocationRecord>,
}

/// Error body returned by the locations endpoint
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "errorCode")]
    error_code: i64,
    #[serde(default)]
    error: String,
}

/// HTTP client for the locations endpoint
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ApiError::Unexpected {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self::with_client(client, &config.url))
    }

    /// Creates a client around an existing reqwest client
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests the locations inside `query`
    pub async fn fetch_locations(&self, query: &QueryBox) -> Result<FetchedPayload, ApiError> {
        let url = format!("{}/locations", self.base_url);
        let bounds = &query.bounds;
        debug!(
            url = %url,
            source = %query.data_source,
            ne_lat = bounds.northeast.lat,
            ne_lng = bounds.northeast.lng,
            sw_lat = bounds.southwest.lat,
            sw_lng = bounds.southwest.lng,
            "fetching locations"
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("version", API_VERSION.to_string()),
                ("source", query.data_source.clone()),
                ("ne_lat", bounds.northeast.lat.to_string()),
                ("ne_lng", bounds.northeast.lng.to_string()),
                ("sw_lat", bounds.southwest.lat.to_string()),
                ("sw_lng", bounds.southwest.lng.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        let result = parse_response(status.is_success(), &text, &query.data_source);
        match &result {
            Ok(payload) => debug!(
                status = %status,
                locations = payload.locations.len(),
                sources = payload.sources.len(),
                "locations fetched"
            ),
            Err(e) if e.is_soft() => debug!(status = %status, "no locations in box"),
            Err(e) => warn!(status = %status, code = e.code(), error = %e, "locations request failed"),
        }
        result
    }
}

#[async_trait]
impl NetworkFetcher for ApiClient {
    async fn fetch(&self, query: &QueryBox) -> Result<FetchedPayload, ApiError> {
        self.fetch_locations(query).await
    }
}

/// Parses a response body into a payload or a typed error
///
/// An error body wins over the HTTP status; a success body with no locations
/// is reported as [`ApiError::NoResults`].
fn parse_response(
    success: bool,
    body: &str,
    data_source: &str,
) -> Result<FetchedPayload, ApiError> {
    if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
        return Err(ApiError::from_code(err.error_code, &err.error, data_source));
    }

    if !success {
        return Err(ApiError::Unexpected {
            message: "server returned an error status without an error code".to_string(),
        });
    }

    let response: ApiResponse = serde_json::from_str(body).map_err(|e| ApiError::Unexpected {
        message: format!("failed to parse locations response: {}", e),
    })?;

    if response.locations.is_empty() {
        return Err(ApiError::NoResults);
    }

    Ok(FetchedPayload {
        sources: response.sources,
        locations: response.locations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_RESPONSE: &str = r#"{
        "sources": [
            {"shortName": "ziv", "name": "Zenius -I- vanisher.com",
             "infoURL": "https://zenius-i-vanisher.com/v5.2/arcade.php?id=${sid}",
             "hasDDR": true}
        ],
        "locations": [
            {"id": 17, "src": "ziv", "sid": "4411", "name": "Round1",
             "city": "Seattle", "lat": 47.6, "lng": -122.3, "hasDDR": true},
            {"id": 18, "src": "ziv", "sid": "4412", "name": "Add-a-Ball",
             "city": "Seattle", "lat": 47.65, "lng": -122.35}
        ]
    }"#;

    #[test]
    fn test_parse_valid_response() {
        let payload = parse_response(true, VALID_RESPONSE, "ziv").expect("should parse");

        assert_eq!(payload.sources.len(), 1);
        assert_eq!(payload.sources[0].key, "ziv");
        assert!(payload.sources[0].has_machine);
        assert_eq!(payload.locations.len(), 2);
        assert_eq!(payload.locations[0].has_machine, Some(true));
        assert_eq!(payload.locations[1].has_machine, None);
    }

    #[test]
    fn test_parse_empty_locations_is_no_results() {
        let result = parse_response(true, r#"{"sources": [], "locations": []}"#, "ziv");
        assert_eq!(result.unwrap_err(), ApiError::NoResults);
    }

    #[test]
    fn test_parse_error_codes() {
        let body = |code: i64| format!(r#"{{"errorCode": {}, "error": "nope"}}"#, code);

        assert_eq!(
            parse_response(false, &body(1), "ziv").unwrap_err(),
            ApiError::ClientVersionMismatch
        );
        assert_eq!(
            parse_response(false, &body(20), "ziv").unwrap_err(),
            ApiError::OversizedBox
        );
        assert_eq!(
            parse_response(true, &body(21), "ziv").unwrap_err(),
            ApiError::NoResults
        );
        assert_eq!(
            parse_response(false, &body(22), "nowhere").unwrap_err(),
            ApiError::UnknownDataSource {
                data_source: "nowhere".to_string()
            }
        );
    }

    #[test]
    fn test_parse_unknown_error_code_is_unexpected() {
        let err = parse_response(false, r#"{"errorCode": 99, "error": "boom"}"#, "ziv")
            .unwrap_err();

        match err {
            ApiError::Unexpected { message } => {
                assert!(message.contains("99"));
                assert!(message.contains("boom"));
            }
            other => panic!("expected Unexpected, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_status_without_body() {
        let err = parse_response(false, "<html>502 Bad Gateway</html>", "ziv").unwrap_err();
        assert!(matches!(err, ApiError::Unexpected { .. }));
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_response(true, "{not json", "ziv").unwrap_err();
        assert!(matches!(err, ApiError::Unexpected { .. }));
    }

    #[test]
    fn test_parse_object_without_locations_is_unexpected() {
        for body in ["{}", r#"{"unexpected": 1}"#, r#"{"sources": []}"#] {
            let err = parse_response(true, body, "ziv").unwrap_err();
            assert!(
                matches!(err, ApiError::Unexpected { .. }),
                "body {} gave {:?}",
                body,
                err
            );
        }
    }

    #[test]
    fn test_parse_locations_without_sources() {
        let body = r#"{"locations": [
            {"id": 3, "src": "ziv", "sid": "3", "name": "Arcade", "lat": 1.0, "lng": 2.0}
        ]}"#;
        let payload = parse_response(true, body, "ziv").expect("should parse");
        assert!(payload.sources.is_empty());
        assert_eq!(payload.locations.len(), 1);
    }

    #[test]
    fn test_error_codes_round_trip() {
        for err in [
            ApiError::NoResults,
            ApiError::OversizedBox,
            ApiError::ClientVersionMismatch,
            ApiError::UnknownDataSource {
                data_source: "x".to_string(),
            },
        ] {
            assert_eq!(ApiError::from_code(err.code(), "", "x"), err);
        }
        assert_eq!(
            ApiError::Unexpected {
                message: String::new()
            }
            .code(),
            0
        );
    }

    #[test]
    fn test_only_no_results_is_soft() {
        assert!(ApiError::NoResults.is_soft());
        assert!(!ApiError::OversizedBox.is_soft());
        assert!(!ApiError::ClientVersionMismatch.is_soft());
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let messages = [
            ApiError::NoResults.user_message(),
            ApiError::OversizedBox.user_message(),
            ApiError::ClientVersionMismatch.user_message(),
            ApiError::UnknownDataSource {
                data_source: "x".to_string(),
            }
            .user_message(),
            ApiError::Unexpected {
                message: "x".to_string(),
            }
            .user_message(),
        ];

        for (i, a) in messages.iter().enumerate() {
            for (j, b) in messages.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ApiClient::with_client(Client::new(), "https://example.com/v4/");
        assert_eq!(client.base_url(), "https://example.com/v4");
    }
}
