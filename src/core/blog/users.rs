//! User endpoints

use serde_json::Value;

use crate::core::auth::UserProfile;
use crate::core::blog::models::{Post, UserDraft};
use crate::core::blog::{BlogError, logged};
use crate::core::http::ApiClient;

const RESOURCE: &str = "users";

#[derive(Debug, Clone, Copy)]
pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UsersApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<UserProfile>, BlogError> {
        logged(RESOURCE, "list", self.client.get("/api/users/").await)
    }

    pub async fn get(&self, id: i64) -> Result<UserProfile, BlogError> {
        logged(
            RESOURCE,
            "get",
            self.client.get(&format!("/api/users/{id}")).await,
        )
    }

    pub async fn create(&self, draft: &UserDraft) -> Result<UserProfile, BlogError> {
        logged(RESOURCE, "create", self.client.post("/api/users/", draft).await)
    }

    pub async fn update(&self, id: i64, draft: &UserDraft) -> Result<UserProfile, BlogError> {
        logged(
            RESOURCE,
            "update",
            self.client.put(&format!("/api/users/{id}"), draft).await,
        )
    }

    pub async fn delete(&self, id: i64) -> Result<Value, BlogError> {
        logged(
            RESOURCE,
            "delete",
            self.client.delete(&format!("/api/users/{id}")).await,
        )
    }

    /// Posts written by the user
    pub async fn posts(&self, user_id: i64) -> Result<Vec<Post>, BlogError> {
        self.client.posts().by_user(user_id).await
    }
}
