//! Client-side authentication session
//!
//! This module provides:
//! - JWT payload decoding for expiration checks
//! - Typed access to the persisted session keys
//! - The session manager (login, signup, logout, refresh, current user)
//! - Security event handling
//! - Session events for the UI layer

pub mod events;
pub mod jwt;
pub mod models;
pub mod security;
pub mod service;
pub mod storage;

pub use events::{Notice, NoticeLevel, SessionEvent};
pub use jwt::{Claims, JwtError};
pub use models::{
    AuthResponse, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest, Role,
    SecurityAlert, SessionCheck, SignupForm, StoredAuth, StoredTokens, TokenInfo, UserProfile,
};
pub use service::{AuthError, RefreshPolicy, SessionManager};
pub use storage::AuthStorage;

pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const REGISTER_PATH: &str = "/api/v1/auth/register";
pub const LOGOUT_PATH: &str = "/api/v1/auth/logout";
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";
pub const SECURITY_ALERT_PATH: &str = "/api/v1/auth/security-alert";
