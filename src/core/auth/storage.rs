//! Auth-specific accessors over the key-value store

use std::sync::Arc;

use futures::future::{try_join, try_join_all, try_join3};
use serde_json::Value;

use crate::core::auth::models::{AuthResponse, StoredAuth, StoredTokens};
use crate::core::db::{KeyValueStore, StoreError, StoreKey};

/// Typed view of the persisted session keys.
///
/// Cloning shares the underlying store.
#[derive(Debug, Clone)]
pub struct AuthStorage {
    store: Arc<dyn KeyValueStore>,
}

impl AuthStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    async fn get_string(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        let value = self.store.get(key.as_str()).await?;
        Ok(value
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty()))
    }

    pub async fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.get_string(StoreKey::AuthToken).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.get_string(StoreKey::RefreshToken).await
    }

    /// Cached user profile as stored
    pub async fn user_data(&self) -> Result<Option<Value>, StoreError> {
        let value = self.store.get(StoreKey::UserData.as_str()).await?;
        Ok(value.filter(|v| !v.is_null()))
    }

    /// Both tokens, read concurrently
    pub async fn tokens(&self) -> Result<StoredTokens, StoreError> {
        let (token, refresh_token) = try_join(self.access_token(), self.refresh_token()).await?;
        Ok(StoredTokens {
            token,
            refresh_token,
        })
    }

    pub async fn snapshot(&self) -> Result<StoredAuth, StoreError> {
        let (token, refresh_token, user) =
            try_join3(self.access_token(), self.refresh_token(), self.user_data()).await?;
        Ok(StoredAuth {
            token,
            refresh_token,
            user,
        })
    }

    /// Persist whichever session fields the response carries.
    ///
    /// Absent fields leave the stored value untouched. Returns the number of
    /// keys written.
    pub async fn save_auth_response(&self, response: &AuthResponse) -> Result<usize, StoreError> {
        let mut writes = Vec::with_capacity(3);

        if let Some(token) = response.access_token() {
            writes.push(
                self.store
                    .set(StoreKey::AuthToken.as_str(), Value::from(token)),
            );
        }
        if let Some(refresh_token) = response.refresh_token() {
            writes.push(
                self.store
                    .set(StoreKey::RefreshToken.as_str(), Value::from(refresh_token)),
            );
        }
        if let Some(user) = response.user() {
            writes.push(self.store.set(StoreKey::UserData.as_str(), user.clone()));
        }

        let written = try_join_all(writes).await?.len();
        tracing::debug!(keys = written, "Auth data saved");
        Ok(written)
    }

    pub async fn clear_refresh_token(&self) -> Result<bool, StoreError> {
        self.store.delete(StoreKey::RefreshToken.as_str()).await
    }

    /// Delete the known session keys, leaving any other entries in place
    pub async fn clear_auth_data(&self) -> Result<(), StoreError> {
        for key in StoreKey::ALL {
            self.store.delete(key.as_str()).await?;
        }
        Ok(())
    }

    /// Wipe the whole table
    pub async fn clear_all(&self) -> Result<bool, StoreError> {
        self.store.clear().await
    }

    /// Store client route logs. `Null` is ignored.
    pub async fn store_route_logs(&self, logs: Value) -> Result<(), StoreError> {
        if logs.is_null() {
            return Ok(());
        }
        self.store.set(StoreKey::RouteLogs.as_str(), logs).await?;
        Ok(())
    }

    pub async fn route_logs(&self) -> Result<Option<Value>, StoreError> {
        self.store.get(StoreKey::RouteLogs.as_str()).await
    }
}
