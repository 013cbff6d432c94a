//! Posts endpoints

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::core::blog::models::{PageRequest, Post, PostDraft, PostPage};
use crate::core::blog::{BlogError, logged, public_read};
use crate::core::http::{ApiClient, ApiError};

const RESOURCE: &str = "posts";

/// Posts API over a borrowed client
#[derive(Debug, Clone, Copy)]
pub struct PostsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PostsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// One page of posts. An empty page if the backend refuses the bearer.
    pub async fn list(&self, page: &PageRequest) -> Result<PostPage, BlogError> {
        tracing::debug!(
            page_number = page.page_number,
            page_size = page.page_size,
            "Listing posts"
        );
        public_read(
            RESOURCE,
            "list",
            self.client.get_with_query("/api/posts", page).await,
        )
    }

    /// Post by id. `None` if the backend refuses the bearer.
    pub async fn get(&self, id: i64) -> Result<Option<Post>, BlogError> {
        let result: Result<Post, ApiError> = self.client.get(&format!("/api/posts/{id}")).await;
        public_read(RESOURCE, "get", result.map(Some))
    }

    pub async fn create(
        &self,
        user_id: i64,
        category_id: i64,
        draft: &PostDraft,
    ) -> Result<Post, BlogError> {
        let path = format!("/api/user/{user_id}/category/{category_id}/posts");
        logged(RESOURCE, "create", self.client.post(&path, draft).await)
    }

    pub async fn update(&self, id: i64, draft: &PostDraft) -> Result<Post, BlogError> {
        tracing::debug!(post_id = id, "Updating post");
        logged(
            RESOURCE,
            "update",
            self.client.put(&format!("/api/posts/{id}"), draft).await,
        )
    }

    /// Delete a post. A 403 means the caller is neither author nor admin.
    pub async fn delete(&self, id: i64) -> Result<Value, BlogError> {
        match self.client.delete::<Value>(&format!("/api/posts/{id}")).await {
            Err(ApiError::AuthenticationFailed { status: 403, .. }) => {
                tracing::warn!(post_id = id, "Post delete forbidden");
                Err(BlogError::DeleteForbidden)
            }
            other => logged(RESOURCE, "delete", other),
        }
    }

    pub async fn by_category(&self, category_id: i64) -> Result<Vec<Post>, BlogError> {
        public_read(
            RESOURCE,
            "by_category",
            self.client
                .get(&format!("/api/category/{category_id}/posts"))
                .await,
        )
    }

    pub async fn by_user(&self, user_id: i64) -> Result<Vec<Post>, BlogError> {
        logged(
            RESOURCE,
            "by_user",
            self.client.get(&format!("/api/user/{user_id}/posts")).await,
        )
    }

    /// Keyword search. Empty results if the backend refuses the bearer.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Post>, BlogError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(BlogError::MissingArgument("keyword"));
        }

        let path = format!("/api/posts/search/{}", urlencoding::encode(keyword));
        public_read(RESOURCE, "search", self.client.get(&path).await)
    }

    /// Upload the post's image as multipart field `image`
    pub async fn upload_image(
        &self,
        post_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Post, BlogError> {
        if bytes.is_empty() {
            return Err(BlogError::MissingArgument("image file"));
        }

        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("image", part);
        logged(
            RESOURCE,
            "upload_image",
            self.client
                .post_multipart(&format!("/api/post/image/upload/{post_id}"), form)
                .await,
        )
    }
}
