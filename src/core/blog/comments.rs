//! Comment endpoints

use serde_json::Value;

use crate::core::blog::models::{Comment, CommentDraft};
use crate::core::blog::{BlogError, logged};
use crate::core::http::ApiClient;

const RESOURCE: &str = "comments";

#[derive(Debug, Clone, Copy)]
pub struct CommentsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CommentsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Comment>, BlogError> {
        logged(RESOURCE, "list", self.client.get("/api/comments").await)
    }

    pub async fn for_post(&self, post_id: i64) -> Result<Vec<Comment>, BlogError> {
        logged(
            RESOURCE,
            "for_post",
            self.client
                .get(&format!("/api/comments/post/{post_id}"))
                .await,
        )
    }

    pub async fn create(&self, post_id: i64, draft: &CommentDraft) -> Result<Comment, BlogError> {
        if draft.content.trim().is_empty() {
            return Err(BlogError::MissingArgument("comment content"));
        }

        logged(
            RESOURCE,
            "create",
            self.client
                .post(&format!("/api/comments/post/{post_id}/comments"), draft)
                .await,
        )
    }

    pub async fn update(&self, id: i64, draft: &CommentDraft) -> Result<Comment, BlogError> {
        logged(
            RESOURCE,
            "update",
            self.client.put(&format!("/api/comments/{id}"), draft).await,
        )
    }

    pub async fn delete(&self, id: i64) -> Result<Value, BlogError> {
        logged(
            RESOURCE,
            "delete",
            self.client.delete(&format!("/api/comments/{id}")).await,
        )
    }
}
