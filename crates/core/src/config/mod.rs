//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (READTHROUGH_*)
//! 2. TOML config file (if READTHROUGH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Assets cached by the install event when nothing else is configured.
pub const DEFAULT_ASSETS: &[&str] = &[
    "./",
    "./calculator.html",
    "./manifest.json",
    "https://cdn.tailwindcss.com",
    "https://rsms.me/inter/inter.css",
];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (READTHROUGH_*)
/// 2. TOML config file (if READTHROUGH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the cache generation the worker reads and writes.
    ///
    /// Changing it is the only way to invalidate previously cached assets;
    /// stores under older names are left in place.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Asset identifiers cached on install, in order.
    ///
    /// Relative entries are resolved against `scope_url`.
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,

    /// Base URL of the controlled application.
    ///
    /// Set via READTHROUGH_SCOPE_URL environment variable.
    #[serde(default = "default_scope_url")]
    pub scope_url: String,

    /// Path to SQLite cache database.
    ///
    /// Set via READTHROUGH_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Number of asset fetches in flight during install.
    #[serde(default = "default_prefetch_concurrency")]
    pub prefetch_concurrency: usize,

    /// Whether the host dispatches the install event at startup.
    #[serde(default = "default_true")]
    pub install_on_start: bool,
}

fn default_cache_name() -> String {
    "trustbureau-v1".into()
}

fn default_assets() -> Vec<String> {
    DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect()
}

fn default_scope_url() -> String {
    "http://localhost:8080/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./readthrough-cache.sqlite")
}

fn default_user_agent() -> String {
    "readthrough/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_prefetch_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            assets: default_assets(),
            scope_url: default_scope_url(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            prefetch_concurrency: default_prefetch_concurrency(),
            install_on_start: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `READTHROUGH_`
    /// 2. TOML file from `READTHROUGH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("READTHROUGH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("READTHROUGH_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_name, "trustbureau-v1");
        assert_eq!(config.assets.len(), 5);
        assert_eq!(config.assets[0], "./");
        assert_eq!(config.scope_url, "http://localhost:8080/");
        assert_eq!(config.db_path, PathBuf::from("./readthrough-cache.sqlite"));
        assert_eq!(config.user_agent, "readthrough/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.prefetch_concurrency, 4);
        assert!(config.install_on_start);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
            cache_name = "shell-v2"
            assets = ["./index.html"]
            "#,
        ));
        let config: AppConfig = figment.extract().unwrap();
        assert_eq!(config.cache_name, "shell-v2");
        assert_eq!(config.assets, vec!["./index.html".to_string()]);
        assert_eq!(config.user_agent, "readthrough/0.1");
    }
}
