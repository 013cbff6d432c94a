//! Session manager
//!
//! The single authority for whether the user is logged in, who the current
//! user is, and which bearer token the shared `ApiClient` attaches. Session
//! state is derived from the store on every call; the manager itself only
//! keeps an "initializing" flag and the refresh gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::sync::{Mutex, broadcast};

use crate::core::auth::events::SessionEvent;
use crate::core::auth::jwt;
use crate::core::auth::models::{
    AuthResponse, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest, SessionCheck,
    SignupForm, TokenInfo, UserProfile,
};
use crate::core::auth::storage::AuthStorage;
use crate::core::auth::{LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH, REGISTER_PATH};
use crate::core::db::{KeyValueStore, StoreError};
use crate::core::http::{ApiClient, ApiError};

const EVENT_CAPACITY: usize = 32;
const REDACTED_PREFIX_LEN: usize = 50;

/// Session manager error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No user data available. Please login again.")]
    NoUserData,

    #[error("Failed to get user data. Please login again. ({0})")]
    InvalidUserData(String),

    #[error("No token found")]
    NoToken,

    #[error("No refresh token found")]
    NoRefreshToken,

    #[error("Token is expired and refresh failed: {0}")]
    RefreshFailed(#[source] Box<AuthError>),
}

impl AuthError {
    /// Message suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Storage(e) => e.user_message(),
            AuthError::Api(e) => e.user_message(),
            AuthError::NoUserData => "No user data available. Please login again.".to_string(),
            AuthError::InvalidUserData(_) => {
                "Failed to get user data. Please login again.".to_string()
            }
            AuthError::NoToken | AuthError::NoRefreshToken | AuthError::RefreshFailed(_) => {
                "Session expired. Please login again.".to_string()
            }
        }
    }

    /// Whether the UI should send the user back to the login page
    pub fn requires_reauth(&self) -> bool {
        match self {
            AuthError::Api(e) => e.is_auth_failure(),
            AuthError::Storage(_) => false,
            _ => true,
        }
    }
}

/// How concurrent token checks share an expired-token refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// First caller refreshes; concurrent callers wait and reuse its result
    #[default]
    SingleFlight,
    /// Every caller refreshes; the last response stored wins
    AtLeastOnce,
}

/// Session manager
#[derive(Debug)]
pub struct SessionManager {
    pub(crate) storage: AuthStorage,
    pub(crate) client: ApiClient,
    policy: RefreshPolicy,
    refresh_gate: Mutex<()>,
    initializing: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Create a session manager over `store`, driving `client`'s bearer header
    pub fn new(store: Arc<dyn KeyValueStore>, client: ApiClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage: AuthStorage::new(store),
            client,
            policy: RefreshPolicy::default(),
            refresh_gate: Mutex::new(()),
            initializing: AtomicBool::new(false),
            events,
        }
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Client whose bearer header this manager maintains
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn storage(&self) -> &AuthStorage {
        &self.storage
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// True while `init_auth` is running
    pub fn is_initializing(&self) -> bool {
        self.initializing.load(Ordering::Acquire)
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // no subscribers is not an error
        let _ = self.events.send(event);
    }

    // ========================================================================
    // Session state
    // ========================================================================

    /// Check the stored access token and repair stale state.
    ///
    /// A valid token is installed as the bearer. An expired or undecodable
    /// token wipes the whole store and clears the bearer (`repaired`). With no
    /// token the bearer is cleared.
    pub async fn check_and_repair_session(&self) -> Result<SessionCheck, AuthError> {
        let token = self.storage.access_token().await?;

        let Some(token) = token else {
            self.client.clear_bearer();
            return Ok(SessionCheck::default());
        };

        if jwt::is_valid(Some(&token)) {
            self.client.set_bearer(&token);
            return Ok(SessionCheck {
                logged_in: true,
                repaired: false,
            });
        }

        self.expire_session("stored access token is no longer valid")
            .await?;
        tracing::info!("Invalid token cleared from storage");

        Ok(SessionCheck {
            logged_in: false,
            repaired: true,
        })
    }

    /// Boolean form of `check_and_repair_session`. Errors read as logged out.
    pub async fn is_logged_in(&self) -> bool {
        match self.check_and_repair_session().await {
            Ok(check) => check.logged_in,
            Err(e) => {
                tracing::warn!("Error checking login status: {}", e);
                false
            }
        }
    }

    /// Startup probe. Never fails; errors are logged and read as logged out.
    pub async fn init_auth(&self) -> SessionCheck {
        let _initializing = InitializingGuard::enter(&self.initializing);

        let check = match self.check_and_repair_session().await {
            Ok(check) => {
                tracing::debug!(
                    logged_in = check.logged_in,
                    repaired = check.repaired,
                    "Auth initialized"
                );
                check
            }
            Err(e) => {
                tracing::warn!("Error initializing auth: {}", e);
                SessionCheck::default()
            }
        };

        check
    }

    // ========================================================================
    // Login / signup / logout
    // ========================================================================

    /// Authenticate and persist whatever session fields the backend returns
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, AuthError> {
        tracing::debug!(email = %credentials.email, "Logging in");

        let response: AuthResponse = self
            .client
            .post(LOGIN_PATH, credentials)
            .await
            .inspect_err(|e| tracing::error!("Login error: {}", e))?;

        if response.has_session_data() {
            self.storage.save_auth_response(&response).await?;
        }

        if let Some(token) = response.access_token() {
            self.client.set_bearer(token);
            tracing::info!(email = %credentials.email, "Logged in");
            self.emit(SessionEvent::LoggedIn);
        }

        Ok(response)
    }

    /// Register a new account. Never authenticates.
    pub async fn signup(&self, form: &SignupForm) -> Result<Value, AuthError> {
        tracing::debug!(email = %form.email, "Signing up");

        let created: Value = self
            .client
            .post(REGISTER_PATH, &RegisterRequest::from(form))
            .await
            .inspect_err(|e| tracing::error!("Signup error: {}", e))?;

        self.emit(SessionEvent::SignedUp);
        Ok(created)
    }

    /// Invalidate tokens on the server if possible, then always wipe locally.
    ///
    /// Only a failure of the local wipe is returned.
    pub async fn logout(&self) -> Result<(), AuthError> {
        match self.storage.tokens().await {
            Ok(tokens) if !tokens.is_empty() => {
                let body = LogoutRequest {
                    token: tokens.token,
                    refresh_token: tokens.refresh_token,
                };
                match self.client.post::<_, Value>(LOGOUT_PATH, &body).await {
                    Ok(_) => tracing::debug!("Server logout successful"),
                    Err(e) => tracing::warn!("Server logout failed, clearing local data: {}", e),
                }
            }
            Ok(_) => tracing::debug!("No tokens found, skipping server logout"),
            Err(e) => tracing::warn!("Error reading tokens during logout: {}", e),
        }

        self.wipe_session().await?;
        tracing::info!("Logged out");
        self.emit(SessionEvent::LoggedOut);
        Ok(())
    }

    // ========================================================================
    // Current user
    // ========================================================================

    /// Cached profile exactly as stored. Never touches the network.
    pub async fn cached_user_data(&self) -> Result<Value, AuthError> {
        self.storage
            .user_data()
            .await?
            .ok_or(AuthError::NoUserData)
    }

    /// Cached profile of the logged-in user. Never touches the network.
    pub async fn get_current_user(&self) -> Result<UserProfile, AuthError> {
        let raw = self.cached_user_data().await?;
        serde_json::from_value(raw).map_err(|e| AuthError::InvalidUserData(e.to_string()))
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Exchange the stored refresh token for a new session.
    ///
    /// Any failure wipes the stored session before the error is returned.
    /// Under `SingleFlight` a call that overlaps a running refresh waits for
    /// it and returns the session it stored instead of refreshing again.
    pub async fn refresh_access_token(&self) -> Result<AuthResponse, AuthError> {
        if self.policy == RefreshPolicy::AtLeastOnce {
            return self.refresh_locked().await;
        }

        let _gate = match self.refresh_gate.try_lock() {
            Ok(gate) => gate,
            Err(_) => {
                let gate = self.refresh_gate.lock().await;
                if let Some(response) = self.session_refreshed_meanwhile().await? {
                    tracing::debug!("Reusing session refreshed by a concurrent caller");
                    return Ok(response);
                }
                gate
            }
        };

        self.refresh_locked().await
    }

    /// Refresh without taking the gate. Callers under `SingleFlight` hold it.
    async fn refresh_locked(&self) -> Result<AuthResponse, AuthError> {
        match self.request_refresh().await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::error!("Token refresh failed: {}", e);
                if let Err(wipe_err) = self.expire_session("token refresh failed").await {
                    tracing::error!("Failed to clear session after refresh failure: {}", wipe_err);
                }
                Err(e)
            }
        }
    }

    /// Stored session, if its access token is valid
    async fn session_refreshed_meanwhile(&self) -> Result<Option<AuthResponse>, AuthError> {
        let snapshot = self.storage.snapshot().await?;
        let Some(token) = snapshot.token.filter(|t| jwt::is_valid(Some(t))) else {
            return Ok(None);
        };

        self.client.set_bearer(&token);
        Ok(Some(AuthResponse {
            token: Some(token),
            refresh_token: snapshot.refresh_token,
            user: snapshot.user,
            ..Default::default()
        }))
    }

    async fn request_refresh(&self) -> Result<AuthResponse, AuthError> {
        let refresh_token = self
            .storage
            .refresh_token()
            .await?
            .ok_or(AuthError::NoRefreshToken)?;

        tracing::debug!("Attempting to refresh access token");
        let response: AuthResponse = self
            .client
            .post(REFRESH_PATH, &RefreshRequest { refresh_token })
            .await?;

        if response.has_session_data() {
            self.storage.save_auth_response(&response).await?;
        }
        if let Some(token) = response.access_token() {
            self.client.set_bearer(token);
        }

        tracing::info!("Access token refreshed");
        self.emit(SessionEvent::TokenRefreshed);
        Ok(response)
    }

    /// Make sure a usable access token is installed, refreshing once if the
    /// stored one has expired.
    pub async fn try_ensure_valid_token(&self) -> Result<(), AuthError> {
        let token = self
            .storage
            .access_token()
            .await?
            .ok_or(AuthError::NoToken)?;

        if jwt::is_valid(Some(&token)) {
            self.client.set_bearer(&token);
            return Ok(());
        }

        tracing::debug!("Access token expired, attempting refresh");
        match self.policy {
            RefreshPolicy::AtLeastOnce => self.refresh_expired().await,
            RefreshPolicy::SingleFlight => {
                let _gate = self.refresh_gate.lock().await;

                // another caller may have refreshed while we waited
                match self.storage.access_token().await? {
                    Some(current) if jwt::is_valid(Some(&current)) => {
                        tracing::debug!("Reusing token refreshed by a concurrent caller");
                        self.client.set_bearer(&current);
                        Ok(())
                    }
                    Some(_) => self.refresh_expired().await,
                    None => Err(AuthError::RefreshFailed(Box::new(AuthError::NoToken))),
                }
            }
        }
    }

    async fn refresh_expired(&self) -> Result<(), AuthError> {
        // a failed refresh has already wiped the session
        self.refresh_locked()
            .await
            .map(|_| ())
            .map_err(|e| AuthError::RefreshFailed(Box::new(e)))
    }

    /// Boolean gate for sensitive writes. Never fails.
    pub async fn ensure_valid_token(&self) -> bool {
        match self.try_ensure_valid_token().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Token validation failed: {}", e);
                false
            }
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Presence and validity of both tokens, with redacted token prefixes.
    /// Storage failures yield an empty report.
    pub async fn current_token_info(&self) -> TokenInfo {
        let snapshot = match self.storage.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Error getting token info: {}", e);
                return TokenInfo::default();
            }
        };

        TokenInfo {
            has_token: snapshot.token.is_some(),
            has_refresh_token: snapshot.refresh_token.is_some(),
            is_valid: jwt::is_valid(snapshot.token.as_deref()),
            refresh_token_valid: jwt::is_valid(snapshot.refresh_token.as_deref()),
            token: snapshot.token.as_deref().map(redact),
            refresh_token: snapshot.refresh_token.as_deref().map(redact),
            user: snapshot.user,
        }
    }

    pub async fn store_route_logs(&self, logs: Value) -> Result<(), AuthError> {
        self.storage.store_route_logs(logs).await?;
        Ok(())
    }
}

/// Holds the initializing flag up until dropped, including on cancellation
struct InitializingGuard<'a>(&'a AtomicBool);

impl<'a> InitializingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(REDACTED_PREFIX_LEN).collect();
    format!("{prefix}...")
}
