//! Userdata repository
//!
//! Durable key-value rows in the `userdata` table. The table is created on
//! first use; later calls skip the migration.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::sync::OnceCell;

use crate::core::db::pool::{StoreConfig, create_pool};
use crate::core::db::store::{KeyValueStore, StoreError};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS userdata (
        key TEXT PRIMARY KEY NOT NULL,
        data TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

/// Userdata repository for database operations
#[derive(Debug)]
pub struct UserDataRepository {
    pool: SqlitePool,
    schema: OnceCell<()>,
}

impl UserDataRepository {
    /// Create a new repository over an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema: OnceCell::new(),
        }
    }

    /// Open the pool described by `config`
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = create_pool(config).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
                tracing::debug!("userdata table ready");
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for UserDataRepository {
    async fn set(&self, key: &str, data: Value) -> Result<Value, StoreError> {
        self.ensure_schema().await?;
        let encoded = serde_json::to_string(&data)?;

        sqlx::query(
            r#"
            INSERT INTO userdata (key, data, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&encoded)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(data)
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.ensure_schema().await?;

        let row: Option<String> = sqlx::query_scalar("SELECT data FROM userdata WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.ensure_schema().await?;

        sqlx::query("DELETE FROM userdata WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(true)
    }

    async fn get_all(&self) -> Result<Vec<Value>, StoreError> {
        self.ensure_schema().await?;

        let rows: Vec<String> = sqlx::query_scalar("SELECT data FROM userdata")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|raw| serde_json::from_str(raw).map_err(StoreError::from))
            .collect()
    }

    async fn clear(&self) -> Result<bool, StoreError> {
        self.ensure_schema().await?;

        sqlx::query("DELETE FROM userdata")
            .execute(&self.pool)
            .await?;

        Ok(true)
    }
}
