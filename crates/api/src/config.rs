//! Application configuration loaded from environment variables.

use batch_delete::{DEFAULT_WORKERS, DeleteConfig, UnmatchedPolicy};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `SERVER_ADDRESS` — bind address (default: `"0.0.0.0:8080"`)
/// - `BASE_URL` — prefix of the returned short URLs (default: `"http://localhost:8080"`)
/// - `DATABASE_DSN` — PostgreSQL connection string; unset means in-memory storage
/// - `DELETE_WORKERS` — concurrent workers per deletion batch (default: `3`)
/// - `DELETE_IGNORE_UNMATCHED` — skip instead of fail deletions that match no link
/// - `COOKIE_SECRET` — key signing the owner cookie (default: a fixed development key)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub base_url: String,
    pub database_dsn: Option<String>,
    pub delete_workers: usize,
    pub delete_ignore_unmatched: bool,
    pub cookie_secret: String,
    pub log_level: String,
}

/// Cookie signing key used when `COOKIE_SECRET` is unset. Development only.
pub const DEV_COOKIE_SECRET: &str = "dev-cookie-secret";

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            server_address: lookup("SERVER_ADDRESS").unwrap_or(defaults.server_address),
            base_url: lookup("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            database_dsn: lookup("DATABASE_DSN").filter(|dsn| !dsn.is_empty()),
            delete_workers: lookup("DELETE_WORKERS")
                .and_then(|w| w.parse::<usize>().ok())
                .map(|w| w.max(1))
                .unwrap_or(defaults.delete_workers),
            delete_ignore_unmatched: lookup("DELETE_IGNORE_UNMATCHED")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.delete_ignore_unmatched),
            cookie_secret: lookup("COOKIE_SECRET")
                .filter(|secret| !secret.is_empty())
                .unwrap_or(defaults.cookie_secret),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Returns the deletion pipeline settings.
    pub fn delete_config(&self) -> DeleteConfig {
        let unmatched = if self.delete_ignore_unmatched {
            UnmatchedPolicy::Ignore
        } else {
            UnmatchedPolicy::Fail
        };
        DeleteConfig::new()
            .with_workers(self.delete_workers)
            .with_unmatched(unmatched)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "0.0.0.0:8080".to_string(),
            base_url: "http://localhost:8080".to_string(),
            database_dsn: None,
            delete_workers: DEFAULT_WORKERS,
            delete_ignore_unmatched: false,
            cookie_secret: DEV_COOKIE_SECRET.to_string(),
            log_level: "info".to_string(),
        }
    }
}
