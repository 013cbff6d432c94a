//! Test helpers: token builders and a stub backend served over real HTTP

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::core::config::{ApiConfig, ApiEnvironment};
use crate::core::http::ApiClient;

// ============================================================================
// Tokens
// ============================================================================

/// Build an unsigned JWT-shaped token carrying `payload`
pub fn token_with_payload(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

/// Token whose `exp` is `offset_secs` from now
pub fn token_expiring_in(offset_secs: i64) -> String {
    token_with_payload(&json!({
        "sub": "a@b.com",
        "exp": Utc::now().timestamp() + offset_secs,
    }))
}

pub fn fresh_token() -> String {
    token_expiring_in(3600)
}

pub fn expired_token() -> String {
    token_expiring_in(-60)
}

// ============================================================================
// Stub backend
// ============================================================================

/// A request received by the stub backend
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
    pub raw_body: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Stub {
    status: StatusCode,
    body: Option<Value>,
    delay: Duration,
}

#[derive(Debug, Default)]
struct BackendState {
    stubs: Mutex<HashMap<(String, String), Stub>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// HTTP backend answering with stubbed responses and recording every request.
///
/// Unstubbed routes answer `404 {"message": "Not found"}`.
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Arc<BackendState>,
    addr: SocketAddr,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let app = Router::new()
            .fallback(handle_request)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.unwrap();
        });

        Self { state, addr }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client pointed at this backend
    pub fn client(&self) -> ApiClient {
        let config =
            ApiConfig::for_environment(ApiEnvironment::Development).with_base_url(self.base_url());
        ApiClient::new(&config).unwrap()
    }

    pub fn stub(&self, method: &str, path: &str, status: u16, body: Value) {
        self.insert(method, path, status, Some(body), Duration::ZERO);
    }

    /// Stub answering with an empty body
    pub fn stub_empty(&self, method: &str, path: &str, status: u16) {
        self.insert(method, path, status, None, Duration::ZERO);
    }

    pub fn stub_delayed(&self, method: &str, path: &str, status: u16, body: Value, delay: Duration) {
        self.insert(method, path, status, Some(body), delay);
    }

    fn insert(&self, method: &str, path: &str, status: u16, body: Option<Value>, delay: Duration) {
        let stub = Stub {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            delay,
        };
        self.state
            .stubs
            .lock()
            .insert((method.to_uppercase(), path.to_string()), stub);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }
}

async fn handle_request(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let recorded = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        raw_body: body.to_vec(),
    };
    state.requests.lock().push(recorded);

    let stub = state
        .stubs
        .lock()
        .get(&(method.to_string(), uri.path().to_string()))
        .cloned();

    match stub {
        Some(stub) => {
            if !stub.delay.is_zero() {
                tokio::time::sleep(stub.delay).await;
            }
            match stub.body {
                Some(body) => (stub.status, axum::Json(body)).into_response(),
                None => stub.status.into_response(),
            }
        }
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({"message": "Not found"})),
        )
            .into_response(),
    }
}
