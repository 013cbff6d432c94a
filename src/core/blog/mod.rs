//! REST resource wrappers for posts, categories, comments and users
//!
//! Each wrapper borrows the shared `ApiClient`, so requests carry whatever
//! bearer the session manager last installed.

pub mod categories;
pub mod comments;
pub mod models;
pub mod posts;
pub mod users;

pub use categories::CategoriesApi;
pub use comments::CommentsApi;
pub use models::{
    Category, CategoryDraft, Comment, CommentDraft, PageRequest, Post, PostDraft, PostPage,
    SortDir, UserDraft, can_modify_post,
};
pub use posts::PostsApi;
pub use users::UsersApi;

use crate::core::http::{ApiClient, ApiError};

/// Resource wrapper errors
#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    #[error("{0} is required")]
    MissingArgument(&'static str),

    #[error(
        "You don't have permission to delete this post. Only the post author or admin can delete posts."
    )]
    DeleteForbidden,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BlogError {
    pub fn user_message(&self) -> String {
        match self {
            BlogError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl ApiClient {
    pub fn posts(&self) -> PostsApi<'_> {
        PostsApi::new(self)
    }

    pub fn categories(&self) -> CategoriesApi<'_> {
        CategoriesApi::new(self)
    }

    pub fn comments(&self) -> CommentsApi<'_> {
        CommentsApi::new(self)
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }
}

/// Log a failed call and lift it into `BlogError`
pub(crate) fn logged<T>(
    resource: &'static str,
    action: &'static str,
    result: Result<T, ApiError>,
) -> Result<T, BlogError> {
    result.map_err(|e| {
        tracing::error!(resource, action, status = ?e.status(), "Request failed: {}", e);
        BlogError::Api(e)
    })
}

/// Public reads degrade to an empty result when the backend refuses the bearer
pub(crate) fn public_read<T: Default>(
    resource: &'static str,
    action: &'static str,
    result: Result<T, ApiError>,
) -> Result<T, BlogError> {
    match result {
        Err(e) if e.is_auth_failure() => {
            tracing::debug!(
                resource,
                action,
                "Authentication failed for public endpoint, returning empty result"
            );
            Ok(T::default())
        }
        other => logged(resource, action, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            BlogError::MissingArgument("keyword").user_message(),
            "keyword is required"
        );
        assert!(
            BlogError::DeleteForbidden
                .user_message()
                .starts_with("You don't have permission to delete this post.")
        );
        assert_eq!(
            BlogError::Api(ApiError::Network("refused".to_string())).user_message(),
            "Network error. Please check your connection."
        );
    }

    #[test]
    fn test_public_read_degrades_on_auth_failure() {
        let denied: Result<Vec<i64>, ApiError> = Err(ApiError::AuthenticationFailed {
            status: 401,
            message: "Unauthorized".to_string(),
        });
        assert_eq!(public_read("posts", "list", denied).unwrap(), Vec::<i64>::new());

        let down: Result<Vec<i64>, ApiError> = Err(ApiError::Server {
            status: 500,
            message: "down".to_string(),
        });
        assert!(matches!(
            public_read("posts", "list", down),
            Err(BlogError::Api(ApiError::Server { .. }))
        ));
    }
}
