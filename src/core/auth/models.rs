//! Auth request/response payloads and session views

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login request data
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Signup form as collected by the UI
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("bio", &self.bio)
            .finish()
    }
}

/// Registration payload expected by the backend
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl From<&SignupForm> for RegisterRequest {
    fn from(form: &SignupForm) -> Self {
        Self {
            name: form.name.clone(),
            email: form.email.clone(),
            password: form.password.clone(),
            about: form.bio.clone(),
        }
    }
}

/// Login / refresh response. Every field is optional; unknown fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthResponse {
    /// Access token, ignoring empty strings
    pub fn access_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn user(&self) -> Option<&Value> {
        self.user.as_ref().filter(|u| !u.is_null())
    }

    /// Whether any session field is present
    pub fn has_session_data(&self) -> bool {
        self.access_token().is_some() || self.refresh_token().is_some() || self.user().is_some()
    }
}

/// Refresh request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Logout request carrying whichever tokens are stored
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Role granted to a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

/// Cached user profile, as returned by login/signup/refresh
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }

    /// `ROLE_ADMIN` or `ADMIN`
    pub fn is_admin(&self) -> bool {
        self.has_role("ROLE_ADMIN") || self.has_role("ADMIN")
    }
}

/// Both stored tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredTokens {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}

impl StoredTokens {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.refresh_token.is_none()
    }
}

/// Complete stored auth data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredAuth {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<Value>,
}

/// Outcome of a session check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCheck {
    pub logged_in: bool,
    /// Stale session data was wiped during the check
    pub repaired: bool,
}

/// Diagnostic view of the stored session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub has_token: bool,
    pub has_refresh_token: bool,
    pub is_valid: bool,
    pub refresh_token_valid: bool,
    /// First characters of the access token
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<Value>,
}

/// Security notification sent to the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityAlert {
    pub reason: String,
    /// ISO-8601 UTC timestamp
    pub timestamp: String,
}
