//! Authenticated request helper for the marketplace API.
//!
//! Every request goes to `<api_url><endpoint>` with a JSON body wrapped in the
//! `{ data, version }` envelope. The provider public key is always sent as
//! `X-API-Key`; the user's bearer token is added on request.
//!
//! # Examples
//!
//! ```no_run
//! use faircompute_client::{FairClient, Method, RequestOptions};
//! use faircompute_common::{FairConfig, MemoryTokenStore};
//! use serde_json::{Value, json};
//!
//! # async fn example() -> Result<(), faircompute_client::ClientError> {
//! let config = FairConfig::from_env();
//! let client = FairClient::new(config, MemoryTokenStore::new("user-token"))?;
//!
//! let options = RequestOptions::builder()
//!     .use_bearer_token(true)
//!     .include_version(true)
//!     .build();
//!
//! let response = client
//!     .send::<Value, _>("/api/v1/marketplace/nodes", Method::POST, options, Some(&json!({})))
//!     .await?;
//! println!("{}", response.into_json());
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - **Transport failures** surface as [`ClientError::NetworkError`]
//! - **Non-2xx statuses** surface as [`ClientError::HttpStatus`], with the
//!   status code and any message recovered from the body
//! - **Malformed JSON** in a declared-JSON body surfaces as
//!   [`ClientError::SerializationError`]
//!
//! Nothing is retried.

use std::fmt::Write as _;
use std::sync::Arc;

use log::{debug, error, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use typed_builder::TypedBuilder;

use faircompute_common::{FairConfig, RequestEnvelope, TokenStore};

use crate::error::ClientError;
use crate::response::ApiResponse;

/// Header carrying the provider public key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Per-request authentication and envelope switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, TypedBuilder)]
pub struct RequestOptions {
    /// Attach the provider public key.
    ///
    /// The key is attached to every request regardless; setting this only
    /// writes the same header a second time.
    #[builder(default)]
    pub use_api_key: bool,
    /// Attach `Authorization: Bearer <token>` from the token store.
    #[builder(default)]
    pub use_bearer_token: bool,
    /// Include the API version in the envelope.
    #[builder(default)]
    pub include_version: bool,
}

impl RequestOptions {
    /// API key, bearer token and version all enabled.
    #[must_use]
    pub const fn authenticated() -> Self {
        Self {
            use_api_key: true,
            use_bearer_token: true,
            include_version: true,
        }
    }
}

/// Client for the marketplace REST API.
///
/// Cheap to clone; clones share the connection pool, the configuration and
/// the token store.
///
/// # Security
///
/// The provider key is held in a `SecretString` and never shows up in
/// `Debug` output. The bearer token is read from the [`TokenStore`] on every
/// request and not retained.
#[derive(Clone)]
pub struct FairClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Arc<SecretString>,
    token_store: Arc<dyn TokenStore>,
    config: Arc<FairConfig>,
}

impl std::fmt::Debug for FairClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FairClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FairClient {
    /// Create a new client from a resolved configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved marketplace configuration
    /// * `token_store` - Source of the user's bearer token
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is missing or malformed, or the HTTP
    /// client cannot be built.
    pub fn new(config: FairConfig, token_store: impl TokenStore + 'static) -> Result<Self, ClientError> {
        Self::with_token_store(config, Arc::new(token_store))
    }

    /// Create a new client sharing an existing token store.
    ///
    /// # Errors
    ///
    /// Same as [`FairClient::new`].
    pub fn with_token_store(
        config: FairConfig,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        let base_url = config.api_url().to_string();
        if base_url.is_empty() {
            return Err(ClientError::ConfigurationError(format!(
                "API URL is not configured for the {} environment",
                config.environment()
            )));
        }

        url::Url::parse(&base_url).map_err(|e| {
            ClientError::ConfigurationError(format!("Invalid API URL '{base_url}': {e}"))
        })?;

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url,
            api_key: Arc::new(config.provider_pub_key().clone()),
            token_store,
            config: Arc::new(config),
        })
    }

    /// The configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &FairConfig {
        &self.config
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and decode the response.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Path appended verbatim to the base URL
    /// * `method` - HTTP method
    /// * `options` - Authentication and envelope switches
    /// * `payload` - Envelope `data`; `None` sends `{}`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL or a header value is invalid
    /// - The payload cannot be serialized
    /// - The request fails at the transport level
    /// - The API answers with a non-2xx status
    /// - A body declared as JSON does not parse as `T`
    pub async fn send<T, P>(
        &self,
        endpoint: &str,
        method: Method,
        options: RequestOptions,
        payload: Option<&P>,
    ) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized + Sync,
    {
        let url = format!("{}{}", self.base_url, endpoint);

        // Validate URL construction
        let url = reqwest::Url::parse(&url)
            .map_err(|e| ClientError::ConfigurationError(format!("Invalid URL '{url}': {e}")))?;

        let headers = self.headers(endpoint, options)?;
        let body = RequestEnvelope::new(payload)?
            .with_version(options.include_version)
            .to_body()?;

        debug!("{method} {url}");

        let response = self
            .http
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        Self::decode(response).await
    }

    fn headers(&self, endpoint: &str, options: RequestOptions) -> Result<HeaderMap, ClientError> {
        let api_key = sensitive_value(self.api_key.expose_secret())?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, api_key.clone());

        // Same header as above; the flag has never changed what is sent.
        if options.use_api_key {
            headers.insert(API_KEY_HEADER, api_key);
        }

        if options.use_bearer_token {
            match self.token_store.token() {
                Some(token) => {
                    let value = sensitive_value(&format!("Bearer {}", token.expose_secret()))?;
                    headers.insert(AUTHORIZATION, value);
                }
                None => warn!("Bearer token requested for {endpoint} but none is stored"),
            }
        }

        Ok(headers)
    }

    async fn status_error(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let mut message = format!("Failed to fetch data. Status code: {status}");

        let detail = if is_json(response.headers()) {
            response
                .json::<Value>()
                .await
                .map(|body| body.get("message").and_then(message_text))
        } else {
            response.text().await.map(Some)
        };

        match detail {
            Ok(Some(detail)) => {
                let _ = write!(message, ", Error message: {detail}");
            }
            Ok(None) => {}
            Err(e) => {
                error!("Failed to parse error response: {e}");
                let _ = write!(message, ", Error parsing response: {e}");
            }
        }

        debug!("API request failed: {message}");
        ClientError::HttpStatus { status, message }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<ApiResponse<T>, ClientError> {
        if is_json(response.headers()) {
            let bytes = response.bytes().await?;
            let parsed = serde_json::from_slice(&bytes)?;
            return Ok(ApiResponse::Json(parsed));
        }

        let text = response.text().await?;
        match serde_json::from_str(&text) {
            Ok(parsed) => Ok(ApiResponse::ParsedText(parsed)),
            Err(e) => {
                debug!("Response text is not JSON ({e}), returning it as-is");
                Ok(ApiResponse::Text(text))
            }
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn sensitive_value(value: &str) -> Result<HeaderValue, ClientError> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|e| ClientError::ConfigurationError(format!("Invalid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use faircompute_common::{FairConfig, MemoryTokenStore};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn create_test_client(base_url: &str, token_store: MemoryTokenStore) -> FairClient {
        let config = FairConfig::default()
            .with_api_url(base_url)
            .with_provider_pub_key("pub-key");
        FairClient::new(config, token_store).unwrap()
    }

    async fn only_request(mock_server: &MockServer) -> wiremock::Request {
        let mut requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        requests.remove(0)
    }

    #[test]
    fn test_missing_api_url() {
        let result = FairClient::new(FairConfig::default(), MemoryTokenStore::empty());
        assert!(matches!(result, Err(ClientError::ConfigurationError(_))));
    }

    #[test]
    fn test_invalid_api_url() {
        let config = FairConfig::default().with_api_url("not a url");
        let result = FairClient::new(config, MemoryTokenStore::empty());
        assert!(matches!(result, Err(ClientError::ConfigurationError(_))));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = create_test_client("http://localhost:8000", MemoryTokenStore::empty());
        let debug = format!("{client:?}");
        assert!(!debug.contains("pub-key"));
        assert!(debug.contains("http://localhost:8000"));
    }

    #[tokio::test]
    async fn test_rent_scenario() {
        let mock_server = MockServer::start().await;

        let payload = json!({
            "node_id": "n1",
            "cpus": 2,
            "gpus": 1,
            "dram": 1_073_741_824_u64,
            "disk": 0,
            "public_ip": false
        });

        Mock::given(method("POST"))
            .and(path("/api/v1/marketplace/providers/nodes/rent"))
            .and(header("content-type", "application/json"))
            .and(header("x-api-key", "pub-key"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({ "data": payload, "version": "2024-07-04" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "executor_id": "e1" } })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::new("tok"));
        let response = client
            .send::<Value, _>(
                "/api/v1/marketplace/providers/nodes/rent",
                Method::POST,
                RequestOptions::authenticated(),
                Some(&payload),
            )
            .await
            .unwrap();

        assert_eq!(
            response,
            ApiResponse::Json(json!({ "data": { "executor_id": "e1" } }))
        );
    }

    #[tokio::test]
    async fn test_empty_payload_and_no_version() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/status"))
            .and(body_json(json!({ "data": {} })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::empty());
        let response = client
            .send::<Value, Value>("/status", Method::GET, RequestOptions::default(), None)
            .await
            .unwrap();

        assert_eq!(response.into_json(), json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_api_key_sent_even_when_flag_is_off() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::empty());
        let options = RequestOptions::builder().use_api_key(false).build();
        client
            .send::<Value, Value>("/x", Method::POST, options, None)
            .await
            .unwrap();

        let request = only_request(&mock_server).await;
        assert_eq!(request.headers.get("x-api-key").unwrap(), "pub-key");
        assert_eq!(
            request.headers.get_all("x-api-key").iter().count(),
            1,
            "the key must not be sent twice"
        );
    }

    #[tokio::test]
    async fn test_no_bearer_header_unless_requested() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::new("tok"));
        client
            .send::<Value, Value>("/x", Method::POST, RequestOptions::default(), None)
            .await
            .unwrap();

        let request = only_request(&mock_server).await;
        assert!(request.headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_no_bearer_header_when_store_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::empty());
        let options = RequestOptions::builder().use_bearer_token(true).build();
        client
            .send::<Value, Value>("/x", Method::POST, options, None)
            .await
            .unwrap();

        let request = only_request(&mock_server).await;
        assert!(request.headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_non_json_text_returned_as_is() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("hello", "text/plain"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::empty());
        let response = client
            .send::<Value, Value>("/hello", Method::GET, RequestOptions::default(), None)
            .await
            .unwrap();

        assert_eq!(response, ApiResponse::Text("hello".to_string()));
        assert_eq!(response.into_json(), json!("hello"));
    }

    #[tokio::test]
    async fn test_json_text_with_other_content_type_is_parsed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"x":1}"#, "text/plain"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::empty());
        let response = client
            .send::<Value, Value>("/x", Method::GET, RequestOptions::default(), None)
            .await
            .unwrap();

        assert_eq!(response, ApiResponse::ParsedText(json!({ "x": 1 })));
    }

    #[tokio::test]
    async fn test_malformed_declared_json_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::empty());
        let result = client
            .send::<Value, Value>("/x", Method::GET, RequestOptions::default(), None)
            .await;

        assert!(matches!(result, Err(ClientError::SerializationError(_))));
    }

    #[tokio::test]
    async fn test_error_status_with_json_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "bad node" })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::empty());
        let error = client
            .send::<Value, Value>("/x", Method::POST, RequestOptions::default(), None)
            .await
            .unwrap_err();

        assert_eq!(error.status_code(), Some(400));
        assert_eq!(
            error.to_string(),
            "Failed to fetch data. Status code: 400, Error message: bad node"
        );
    }

    #[tokio::test]
    async fn test_error_status_with_json_without_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "detail": "nope" })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::empty());
        let error = client
            .send::<Value, Value>("/x", Method::POST, RequestOptions::default(), None)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Failed to fetch data. Status code: 422");
    }

    #[tokio::test]
    async fn test_error_status_with_text_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_raw("no such node", "text/plain"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::empty());
        let error = client
            .send::<Value, Value>("/x", Method::GET, RequestOptions::default(), None)
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Failed to fetch data. Status code: 404, Error message: no such node"
        );
    }

    #[tokio::test]
    async fn test_error_status_with_unparseable_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_raw("<html>", "application/json"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), MemoryTokenStore::empty());
        let error = client
            .send::<Value, Value>("/x", Method::GET, RequestOptions::default(), None)
            .await
            .unwrap_err();

        assert_eq!(error.status_code(), Some(500));
        let message = error.to_string();
        assert!(message.starts_with("Failed to fetch data. Status code: 500"));
        assert!(message.contains("Error parsing response"));
    }

    #[tokio::test]
    async fn test_network_failure() {
        let client = create_test_client("http://127.0.0.1:1", MemoryTokenStore::empty());
        let error = client
            .send::<Value, Value>("/x", Method::GET, RequestOptions::default(), None)
            .await
            .unwrap_err();

        assert!(error.is_network_error());
    }

    #[test]
    fn test_message_text() {
        assert_eq!(message_text(&json!("oops")), Some("oops".to_string()));
        assert_eq!(message_text(&json!(42)), Some("42".to_string()));
        assert_eq!(message_text(&json!("")), None);
        assert_eq!(message_text(&Value::Null), None);
    }
}
