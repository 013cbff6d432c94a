//! Sqlite connection pool for the durable store
//!
//! The store lives in a single local sqlite file (or in memory for tests).

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Store location override
const ENV_VAR_STORE_URL: &str = "BLOG_STORE_URL";

/// Default database location, relative to the working directory
const DEFAULT_STORE_URL: &str = "sqlite://blog_client.db";

/// In-memory database URL
const MEMORY_STORE_URL: &str = "sqlite::memory:";

/// Store database configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Sqlite connection URL (e.g., sqlite://path/to/file.db)
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection acquire timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_STORE_URL.to_string(),
            max_connections: 4,
            connect_timeout_secs: 5,
        }
    }
}

impl StoreConfig {
    /// Create config from BLOG_STORE_URL, falling back to the default file
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(ENV_VAR_STORE_URL).filter(|url| !url.trim().is_empty()) {
            Some(url) => Self::default().database_url(url),
            None => Self::default(),
        }
    }

    /// Private in-memory database (single connection so every query sees the same data)
    pub fn in_memory() -> Self {
        Self {
            database_url: MEMORY_STORE_URL.to_string(),
            max_connections: 1,
            ..Default::default()
        }
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// Set max connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}

/// Create a new connection pool, creating the database file if missing
pub async fn create_pool(config: &StoreConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs));

    if config.is_in_memory() {
        // dropping the last connection would drop the database
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;

    tracing::debug!(url = %config.database_url, "Store pool created");
    Ok(pool)
}
