//! Blog Client - session and REST glue for the blog frontend
//!
//! Keeps the authentication session (tokens and cached profile) in a local
//! key-value store, decodes JWT expirations, refreshes access tokens on demand
//! and issues REST calls to the blog backend through a shared `ApiClient`.

pub mod core;

pub use crate::core::auth::{
    AuthError, AuthResponse, AuthStorage, LoginRequest, Notice, NoticeLevel, RefreshPolicy,
    SessionCheck, SessionEvent, SessionManager, SignupForm, TokenInfo, UserProfile,
};
pub use crate::core::blog::{BlogError, PageRequest, Post, PostDraft, PostPage, can_modify_post};
pub use crate::core::config::{ApiConfig, ApiEnvironment};
#[cfg(feature = "sqlite")]
pub use crate::core::db::{StoreConfig, UserDataRepository};
pub use crate::core::db::{KeyValueStore, MemoryStore, StoreError, StoreOp};
pub use crate::core::http::{ApiClient, ApiError};
