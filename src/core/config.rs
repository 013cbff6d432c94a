//! API configuration from environment variables.
//!
//! Load configuration using `ApiConfig::load()`, or call `dotenvy::dotenv()`
//! yourself and then `ApiConfig::from_env()`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable selecting the deployment environment
pub const ENV_VAR_ENVIRONMENT: &str = "BLOG_ENV";

/// Environment variable overriding the backend base URL (production/staging only)
pub const ENV_VAR_API_URL: &str = "BLOG_API_URL";

const DEFAULT_BACKEND_URL: &str = "http://blogapp-env.eba-fyin5khm.us-east-1.elasticbeanstalk.com";
const DEFAULT_STAGING_URL: &str = "https://your-staging-api-url.com";

/// Recognized deployment environments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiEnvironment {
    #[default]
    Development,
    Production,
    Staging,
}

impl ApiEnvironment {
    /// Default backend base URL for this environment
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ApiEnvironment::Development | ApiEnvironment::Production => DEFAULT_BACKEND_URL,
            ApiEnvironment::Staging => DEFAULT_STAGING_URL,
        }
    }

    /// Default request timeout in milliseconds
    pub fn default_timeout_ms(&self) -> u64 {
        match self {
            ApiEnvironment::Development => 10_000,
            ApiEnvironment::Production => 15_000,
            ApiEnvironment::Staging => 12_000,
        }
    }

    /// Whether `BLOG_API_URL` may override the base URL
    fn allows_url_override(&self) -> bool {
        !matches!(self, ApiEnvironment::Development)
    }
}

impl fmt::Display for ApiEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiEnvironment::Development => write!(f, "development"),
            ApiEnvironment::Production => write!(f, "production"),
            ApiEnvironment::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown environment: {0}")]
pub struct UnknownEnvironment(pub String);

impl FromStr for ApiEnvironment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(ApiEnvironment::Development),
            "production" | "prod" => Ok(ApiEnvironment::Production),
            "staging" => Ok(ApiEnvironment::Staging),
            other => Err(UnknownEnvironment(other.to_string())),
        }
    }
}

/// Backend connection settings for the shared `ApiClient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Environment the settings were derived from
    pub environment: ApiEnvironment,
    /// Backend base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl ApiConfig {
    /// Built-in settings for an environment
    pub fn for_environment(environment: ApiEnvironment) -> Self {
        Self {
            environment,
            base_url: environment.default_base_url().to_string(),
            timeout_ms: environment.default_timeout_ms(),
        }
    }

    /// Load `.env` (if present) and read configuration from the environment.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    /// Read configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unknown or missing environment names fall back to development.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup(ENV_VAR_ENVIRONMENT) {
            Some(raw) => raw.parse().unwrap_or_else(|err: UnknownEnvironment| {
                tracing::warn!("{}, falling back to development", err);
                ApiEnvironment::Development
            }),
            None => ApiEnvironment::Development,
        };

        let mut config = Self::for_environment(environment);

        if environment.allows_url_override() {
            if let Some(url) = lookup(ENV_VAR_API_URL).filter(|u| !u.trim().is_empty()) {
                config = config.with_base_url(url);
            }
        }

        config
    }

    /// Set the base URL (trailing slashes are dropped)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::for_environment(ApiEnvironment::default())
    }
}
