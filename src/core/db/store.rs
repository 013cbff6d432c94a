//! Key-value store contract shared by the in-memory and sqlite backends

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;

/// Keys the client persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    AuthToken,
    RefreshToken,
    UserData,
    RouteLogs,
}

impl StoreKey {
    pub const ALL: [StoreKey; 4] = [
        StoreKey::AuthToken,
        StoreKey::RefreshToken,
        StoreKey::UserData,
        StoreKey::RouteLogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::AuthToken => "authToken",
            StoreKey::RefreshToken => "refreshToken",
            StoreKey::UserData => "userData",
            StoreKey::RouteLogs => "routeLogs",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid action: {0}")]
    InvalidOperation(String),

    #[error("Operation '{op}' requires a {argument}")]
    MissingArgument { op: StoreOp, argument: &'static str },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode stored data: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn user_message(&self) -> String {
        match self {
            StoreError::InvalidOperation(_) | StoreError::MissingArgument { .. } => {
                "An error occurred".to_string()
            }
            _ => "Local storage is unavailable. Please reload the page.".to_string(),
        }
    }
}

/// Named store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Set,
    Get,
    Delete,
    GetAll,
    Clear,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::Set => "set",
            StoreOp::Get => "get",
            StoreOp::Delete => "delete",
            StoreOp::GetAll => "getAll",
            StoreOp::Clear => "clear",
        };
        f.write_str(name)
    }
}

impl FromStr for StoreOp {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set" => Ok(StoreOp::Set),
            "get" => Ok(StoreOp::Get),
            "delete" => Ok(StoreOp::Delete),
            "getAll" => Ok(StoreOp::GetAll),
            "clear" => Ok(StoreOp::Clear),
            other => Err(StoreError::InvalidOperation(other.to_string())),
        }
    }
}

/// Result of a dispatched operation
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutput {
    /// Data written by `set`
    Stored(Value),
    /// Data read by `get` (`None` if the key was never set)
    Value(Option<Value>),
    /// Every stored data value
    Values(Vec<Value>),
    /// Success indicator of `delete` / `clear`
    Done(bool),
}

/// Durable, asynchronous key-value store scoped to one logical table.
///
/// Failures are returned to the caller as-is; implementations do not retry.
#[async_trait]
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Store or overwrite `data` under `key`, returning the stored data
    async fn set(&self, key: &str, data: Value) -> Result<Value, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Remove `key`. Succeeds even if the key is absent.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// All stored data values, in no particular order
    async fn get_all(&self) -> Result<Vec<Value>, StoreError>;

    async fn clear(&self) -> Result<bool, StoreError>;

    /// Execute an operation by value
    async fn execute(
        &self,
        op: StoreOp,
        key: Option<&str>,
        data: Option<Value>,
    ) -> Result<StoreOutput, StoreError> {
        let require_key = |key: Option<&str>| {
            key.map(str::to_owned).ok_or(StoreError::MissingArgument {
                op,
                argument: "key",
            })
        };

        match op {
            StoreOp::Set => {
                let key = require_key(key)?;
                let data = data.ok_or(StoreError::MissingArgument {
                    op,
                    argument: "data value",
                })?;
                Ok(StoreOutput::Stored(self.set(&key, data).await?))
            }
            StoreOp::Get => {
                let key = require_key(key)?;
                Ok(StoreOutput::Value(self.get(&key).await?))
            }
            StoreOp::Delete => {
                let key = require_key(key)?;
                Ok(StoreOutput::Done(self.delete(&key).await?))
            }
            StoreOp::GetAll => Ok(StoreOutput::Values(self.get_all().await?)),
            StoreOp::Clear => Ok(StoreOutput::Done(self.clear().await?)),
        }
    }

    /// Execute an operation by name (`set`, `get`, `delete`, `getAll`, `clear`)
    async fn dispatch(
        &self,
        action: &str,
        key: Option<&str>,
        data: Option<Value>,
    ) -> Result<StoreOutput, StoreError> {
        let op: StoreOp = action.parse()?;
        self.execute(op, key, data).await
    }
}
