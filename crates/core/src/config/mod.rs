//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (INTERCACHE_*)
//! 2. TOML config file (if INTERCACHE_CONFIG_FILE set)
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

/// A resource whose served copies must match a pinned digest.
///
/// `digest` is produced at build time. A missing value is not "skip
/// verification": every cached copy of the resource then fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedResource {
    /// Regular expression matched against the full request URL.
    pub pattern: String,

    /// Expected digest, `sha384-` followed by 96 hex characters.
    #[serde(default)]
    pub digest: Option<String>,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (INTERCACHE_*)
/// 2. TOML config file (if INTERCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via INTERCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix shared by every generation this application creates.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Deployment version tag. Bump it when assets change so stale
    /// generations are dropped on the next activation.
    ///
    /// Set via INTERCACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// The application's own origin, e.g. `https://app.example.com`.
    #[serde(default)]
    pub own_origin: Option<String>,

    /// Loopback origins that are also eligible for caching.
    #[serde(default = "default_loopback_aliases")]
    pub loopback_aliases: Vec<String>,

    /// Resources served only after digest verification.
    #[serde(default = "default_pinned")]
    pub pinned: Vec<PinnedResource>,

    /// Verify a freshly refetched pinned resource before storing it.
    #[serde(default = "default_true")]
    pub verify_refetched: bool,

    /// User-Agent string for outgoing requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body size accepted from the network.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Transport timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./intercache.sqlite")
}

fn default_cache_prefix() -> String {
    "intercache-".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_loopback_aliases() -> Vec<String> {
    vec!["https://localhost".into(), "https://127.0.0.1".into()]
}

fn default_pinned() -> Vec<PinnedResource> {
    vec![
        PinnedResource { pattern: r"/algorithms\.wasm(\?|$)".into(), digest: None },
        PinnedResource { pattern: r"/algorithms\.js(\?|$)".into(), digest: None },
    ]
}

fn default_user_agent() -> String {
    "intercache/0.1".into()
}

fn default_max_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            own_origin: None,
            loopback_aliases: default_loopback_aliases(),
            pinned: default_pinned(),
            verify_refetched: true,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Identifier of the generation this build reads and writes.
    pub fn generation_id(&self) -> String {
        format!("{}{}", self.cache_prefix, self.cache_version)
    }

    /// Own origin followed by the loopback aliases.
    pub fn allowed_origins(&self) -> Vec<String> {
        self.own_origin
            .iter()
            .chain(self.loopback_aliases.iter())
            .cloned()
            .collect()
    }

    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration file cannot be read,
    /// environment variables cannot be parsed, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("INTERCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("INTERCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
