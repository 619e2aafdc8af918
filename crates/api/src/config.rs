use std::time::Duration;

use sfmcp_upstream::SourcesConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Lifetime of a cached response (default: one hour).
    pub cache_ttl_secs: u64,
    /// Age after which notifications are purged (default: `30` days).
    pub notification_retention_days: i64,
    /// How often the retention task runs (default: `3600`).
    pub retention_interval_secs: u64,
    /// Per-call timeout for outbound source requests (default: `30`).
    pub upstream_timeout_secs: u64,
    /// Timeout applied to each branch of a parallel analysis (default: `60`).
    pub parallel_branch_timeout_secs: u64,
    /// Goodreads developer key. Goodreads operations fail as not configured without it.
    pub goodreads_api_key: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                    |
    /// |--------------------------------|----------------------------|
    /// | `HOST`                         | `0.0.0.0`                  |
    /// | `PORT`                         | `8000`                     |
    /// | `CORS_ORIGINS`                 | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS`         | `120`                      |
    /// | `SHUTDOWN_TIMEOUT_SECS`        | `30`                       |
    /// | `CACHE_TTL_SECS`               | `3600`                     |
    /// | `NOTIFICATION_RETENTION_DAYS`  | `30`                       |
    /// | `RETENTION_INTERVAL_SECS`      | `3600`                     |
    /// | `UPSTREAM_TIMEOUT_SECS`        | `30`                       |
    /// | `PARALLEL_BRANCH_TIMEOUT_SECS` | `60`                       |
    /// | `GOODREADS_API_KEY`            | unset                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let cache_ttl_secs: u64 = std::env::var("CACHE_TTL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("CACHE_TTL_SECS must be a valid u64");

        let notification_retention_days: i64 = std::env::var("NOTIFICATION_RETENTION_DAYS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("NOTIFICATION_RETENTION_DAYS must be a valid i64");

        let retention_interval_secs: u64 = std::env::var("RETENTION_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("RETENTION_INTERVAL_SECS must be a valid u64");

        let upstream_timeout_secs: u64 = std::env::var("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("UPSTREAM_TIMEOUT_SECS must be a valid u64");

        let parallel_branch_timeout_secs: u64 = std::env::var("PARALLEL_BRANCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("PARALLEL_BRANCH_TIMEOUT_SECS must be a valid u64");

        let goodreads_api_key = std::env::var("GOODREADS_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            cache_ttl_secs,
            notification_retention_days,
            retention_interval_secs,
            upstream_timeout_secs,
            parallel_branch_timeout_secs,
            goodreads_api_key,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn parallel_branch_timeout(&self) -> Duration {
        Duration::from_secs(self.parallel_branch_timeout_secs)
    }

    /// Settings for the built-in source registry.
    pub fn sources_config(&self) -> SourcesConfig {
        SourcesConfig {
            timeout: Duration::from_secs(self.upstream_timeout_secs),
            goodreads_api_key: self.goodreads_api_key.clone(),
        }
    }
}
