//! Shared request-issuing client
//!
//! Holds the backend base URL, the per-environment timeout and the default
//! `Authorization: Bearer <token>` header. The header is mutated only by the
//! session manager and is read when each request is built, so every request
//! issued after a mutation observes it.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::config::ApiConfig;

/// Errors returned by backend calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed ({status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request failed ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::Client(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl ApiError {
    /// Classify a non-success response
    fn from_response(status: StatusCode, body: &str) -> Self {
        let message = response_message(status, body);
        let code = status.as_u16();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::AuthenticationFailed {
                status: code,
                message,
            },
            s if s.is_server_error() => ApiError::Server {
                status: code,
                message,
            },
            _ => ApiError::Rejected {
                status: code,
                message,
            },
        }
    }

    /// HTTP status, if the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthenticationFailed { status, .. }
            | ApiError::Server { status, .. }
            | ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401 or 403
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::AuthenticationFailed { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// Message suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Network error. Please check your connection.".to_string(),
            ApiError::AuthenticationFailed { .. } => {
                "Authentication failed. Please login again.".to_string()
            }
            ApiError::Server { .. } => "Server error. Please try again later.".to_string(),
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Decode(_) | ApiError::Client(_) => "An error occurred".to_string(),
        }
    }
}

/// `message` (or `error`) field of a JSON error body, else the status reason
fn response_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["message", "error"]
                .iter()
                .find_map(|field| json.get(field).and_then(Value::as_str).map(str::to_string))
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

/// Client for the blog backend.
///
/// Cloning is cheap; clones share the connection pool and the bearer header.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    bearer: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        tracing::debug!(
            environment = %config.environment,
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            "API client configured"
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').into(),
            bearer: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current default bearer token
    pub fn bearer_token(&self) -> Option<String> {
        self.bearer.read().clone()
    }

    /// Current default `Authorization` header value
    pub fn authorization_header(&self) -> Option<String> {
        self.bearer
            .read()
            .as_ref()
            .map(|token| format!("Bearer {token}"))
    }

    pub(crate) fn set_bearer(&self, token: &str) {
        *self.bearer.write() = Some(token.to_string());
    }

    pub(crate) fn clear_bearer(&self) {
        *self.bearer.write() = None;
    }

    /// Absolute URL for a backend path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.authorization_header() {
            Some(value) => builder.header(header::AUTHORIZATION, value),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::DELETE, path)).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path).multipart(form))
            .await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ApiError::from_response(status, &body);
            tracing::debug!(status = status.as_u16(), "Backend rejected request: {}", err);
            return Err(err);
        }

        if body.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ApiEnvironment;
    use crate::core::test_support::MockBackend;
    use serde_json::json;
    use std::time::Duration;

    // ========================================================================
    // Bearer Header Tests
    // ========================================================================

    #[test]
    fn test_bearer_set_and_clear() {
        let client = ApiClient::new(&ApiConfig::default()).unwrap();
        assert_eq!(client.authorization_header(), None);

        client.set_bearer("abc");
        assert_eq!(client.bearer_token().as_deref(), Some("abc"));
        assert_eq!(client.authorization_header().as_deref(), Some("Bearer abc"));

        client.clear_bearer();
        assert_eq!(client.authorization_header(), None);
    }

    #[test]
    fn test_clones_share_bearer() {
        let client = ApiClient::new(&ApiConfig::default()).unwrap();
        let clone = client.clone();

        client.set_bearer("shared");
        assert_eq!(clone.bearer_token().as_deref(), Some("shared"));

        clone.clear_bearer();
        assert_eq!(client.bearer_token(), None);
    }

    #[test]
    fn test_url_joining() {
        let config = ApiConfig::for_environment(ApiEnvironment::Staging)
            .with_base_url("http://localhost:8080/");
        let client = ApiClient::new(&config).unwrap();

        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.url("/api/v1/auth/login"),
            "http://localhost:8080/api/v1/auth/login"
        );
        assert_eq!(client.url("api/posts"), "http://localhost:8080/api/posts");
    }

    // ========================================================================
    // Request Tests
    // ========================================================================

    #[tokio::test]
    async fn test_requests_carry_current_bearer() {
        let backend = MockBackend::start().await;
        backend.stub("GET", "/api/categories/", 200, json!([]));
        let client = backend.client();

        let _: Value = client.get("/api/categories/").await.unwrap();
        client.set_bearer("tok-1");
        let _: Value = client.get("/api/categories/").await.unwrap();
        client.clear_bearer();
        let _: Value = client.get("/api/categories/").await.unwrap();

        let auth: Vec<Option<String>> = backend
            .requests()
            .into_iter()
            .map(|r| r.authorization)
            .collect();
        assert_eq!(auth, vec![None, Some("Bearer tok-1".to_string()), None]);
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let backend = MockBackend::start().await;
        backend.stub("POST", "/api/categories/", 201, json!({"id": 3}));
        let client = backend.client();

        let created: Value = client
            .post("/api/categories/", &json!({"title": "Rust"}))
            .await
            .unwrap();

        assert_eq!(created, json!({"id": 3}));
        let request = &backend.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.body, json!({"title": "Rust"}));
    }

    #[tokio::test]
    async fn test_query_parameters() {
        let backend = MockBackend::start().await;
        backend.stub("GET", "/api/posts", 200, json!({"content": []}));
        let client = backend.client();

        let _: Value = client
            .get_with_query("/api/posts", &[("pageNumber", "2"), ("pageSize", "5")])
            .await
            .unwrap();

        assert_eq!(
            backend.requests()[0].query.as_deref(),
            Some("pageNumber=2&pageSize=5")
        );
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_null() {
        let backend = MockBackend::start().await;
        backend.stub_empty("DELETE", "/api/comments/9", 200);
        let client = backend.client();

        let body: Value = client.delete("/api/comments/9").await.unwrap();
        assert_eq!(body, Value::Null);

        client.delete::<()>("/api/comments/9").await.unwrap();
    }

    // ========================================================================
    // Error Classification Tests
    // ========================================================================

    #[tokio::test]
    async fn test_unauthorized_maps_to_authentication_failed() {
        let backend = MockBackend::start().await;
        backend.stub("PUT", "/api/posts/1", 401, json!({"message": "Full authentication is required"}));
        let client = backend.client();

        let err = client
            .put::<_, Value>("/api/posts/1", &json!({}))
            .await
            .unwrap_err();

        assert!(err.is_auth_failure());
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.user_message(), "Authentication failed. Please login again.");
        assert!(err.to_string().contains("Full authentication is required"));
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_authentication_failed() {
        let backend = MockBackend::start().await;
        backend.stub_empty("DELETE", "/api/posts/1", 403);
        let client = backend.client();

        let err = client.delete::<Value>("/api/posts/1").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::AuthenticationFailed { status: 403, ref message } if message == "Forbidden"
        ));
    }

    #[tokio::test]
    async fn test_server_error() {
        let backend = MockBackend::start().await;
        backend.stub("GET", "/api/users/", 503, json!({"error": "maintenance"}));
        let client = backend.client();

        let err = client.get::<Value>("/api/users/").await.unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 503, ref message } if message == "maintenance"));
        assert_eq!(err.user_message(), "Server error. Please try again later.");
    }

    #[tokio::test]
    async fn test_client_error_uses_backend_message() {
        let backend = MockBackend::start().await;
        backend.stub("POST", "/api/v1/auth/register", 400, json!({"message": "Email already exists"}));
        let client = backend.client();

        let err = client
            .post::<_, Value>("/api/v1/auth/register", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
        assert_eq!(err.user_message(), "Email already exists");
    }

    #[tokio::test]
    async fn test_unstubbed_route_is_not_found() {
        let backend = MockBackend::start().await;
        let client = backend.client();

        let err = client.get::<Value>("/api/nothing").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let config = ApiConfig::default().with_base_url("http://127.0.0.1:9");
        let client = ApiClient::new(&config).unwrap();

        let err = client.get::<Value>("/api/posts").await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.status(), None);
        assert_eq!(err.user_message(), "Network error. Please check your connection.");
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let backend = MockBackend::start().await;
        backend.stub_delayed("GET", "/api/posts", 200, json!({}), Duration::from_millis(500));

        let config = ApiConfig::default()
            .with_base_url(backend.base_url())
            .with_timeout_ms(50);
        let client = ApiClient::new(&config).unwrap();

        let err = client.get::<Value>("/api/posts").await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let backend = MockBackend::start().await;
        backend.stub("GET", "/api/posts/1", 200, json!("just a string"));
        let client = backend.client();

        let err = client.get::<Vec<i64>>("/api/posts/1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.user_message(), "An error occurred");
    }
}
