//! Category endpoints

use serde_json::Value;

use crate::core::blog::models::{Category, CategoryDraft};
use crate::core::blog::{BlogError, logged};
use crate::core::http::ApiClient;

const RESOURCE: &str = "categories";

#[derive(Debug, Clone, Copy)]
pub struct CategoriesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CategoriesApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Category>, BlogError> {
        logged(RESOURCE, "list", self.client.get("/api/categories/").await)
    }

    pub async fn get(&self, id: i64) -> Result<Category, BlogError> {
        logged(
            RESOURCE,
            "get",
            self.client.get(&format!("/api/categories/{id}")).await,
        )
    }

    pub async fn create(&self, draft: &CategoryDraft) -> Result<Category, BlogError> {
        logged(
            RESOURCE,
            "create",
            self.client.post("/api/categories/", draft).await,
        )
    }

    pub async fn update(&self, id: i64, draft: &CategoryDraft) -> Result<Category, BlogError> {
        logged(
            RESOURCE,
            "update",
            self.client.put(&format!("/api/categories/{id}"), draft).await,
        )
    }

    pub async fn delete(&self, id: i64) -> Result<Value, BlogError> {
        logged(
            RESOURCE,
            "delete",
            self.client.delete(&format!("/api/categories/{id}")).await,
        )
    }
}
