//! Configuration management for the newsroom client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default news-source URL (can be overridden at compile time via NEWS_API_URL env var).
pub const DEFAULT_NEWS_API_URL: &str = match option_env!("NEWS_API_URL") {
    Some(url) => url,
    None => "https://newsapi.org/v2/top-headlines",
};

/// Default news-source API key (can be overridden at compile time via NEWS_API_KEY env var).
pub const DEFAULT_NEWS_API_KEY: Option<&str> = option_env!("NEWS_API_KEY");

/// Default identity provider base URL (can be overridden at compile time via IDENTITY_URL env var).
pub const DEFAULT_IDENTITY_URL: &str = match option_env!("IDENTITY_URL") {
    Some(url) => url,
    None => "https://auth.newsroom.dev",
};

/// Default Firestore project id (can be overridden at compile time via FIRESTORE_PROJECT_ID env var).
pub const DEFAULT_FIRESTORE_PROJECT_ID: &str = match option_env!("FIRESTORE_PROJECT_ID") {
    Some(id) => id,
    None => "newsroom",
};

/// Default Firestore web API key (can be overridden at compile time via FIRESTORE_API_KEY env var).
pub const DEFAULT_FIRESTORE_API_KEY: Option<&str> = option_env!("FIRESTORE_API_KEY");

/// Placeholder image used when an article has no `urlToImage`.
pub const DEFAULT_IMAGE_URL: &str = "https://newsroom.dev/assets/default-image.png";

/// Default country for top headlines.
pub const DEFAULT_COUNTRY: &str = "us";

/// Default category for top headlines.
pub const DEFAULT_CATEGORY: &str = "general";

/// Default polling interval for remote live subscriptions.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// News-source endpoint for top headlines.
    #[serde(default = "default_news_api_url")]
    pub news_api_url: String,
    /// News-source API key, sent as `X-Api-Key`.
    #[serde(default = "default_news_api_key")]
    pub news_api_key: Option<String>,
    /// Country used when none is given on the command line.
    #[serde(default = "default_country")]
    pub default_country: String,
    /// Category used when none is given on the command line.
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Identity provider base URL (`{identity_url}/{action}/`).
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    /// Firestore project hosting the `headlines` and `users` collections.
    #[serde(default = "default_firestore_project_id")]
    pub firestore_project_id: String,
    /// Firestore web API key.
    #[serde(default = "default_firestore_api_key")]
    pub firestore_api_key: Option<String>,
    /// Placeholder image for articles without one.
    #[serde(default = "default_image_url")]
    pub default_image_url: String,
    /// Polling interval for live subscriptions against the remote store.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_news_api_url() -> String {
    DEFAULT_NEWS_API_URL.to_string()
}

fn default_news_api_key() -> Option<String> {
    DEFAULT_NEWS_API_KEY.map(|s| s.to_string())
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_identity_url() -> String {
    DEFAULT_IDENTITY_URL.to_string()
}

fn default_firestore_project_id() -> String {
    DEFAULT_FIRESTORE_PROJECT_ID.to_string()
}

fn default_firestore_api_key() -> Option<String> {
    DEFAULT_FIRESTORE_API_KEY.map(|s| s.to_string())
}

fn default_image_url() -> String {
    DEFAULT_IMAGE_URL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            news_api_url: default_news_api_url(),
            news_api_key: default_news_api_key(),
            default_country: default_country(),
            default_category: default_category(),
            identity_url: default_identity_url(),
            firestore_project_id: default_firestore_project_id(),
            firestore_api_key: default_firestore_api_key(),
            default_image_url: default_image_url(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    /// Environment variables are applied last.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("NEWSROOM_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(key) = std::env::var("NEWSROOM_NEWS_API_KEY") {
            let key = key.trim();
            if !key.is_empty() {
                self.news_api_key = Some(key.to_string());
            }
        }
    }

    /// Check that every configured endpoint parses as a URL.
    pub fn validate(&self) -> CoreResult<()> {
        self.news_api_url()?;
        self.identity_url()?;
        if self.firestore_project_id.trim().is_empty() {
            return Err(CoreError::Config(
                "firestore_project_id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the news-source URL as a parsed URL.
    pub fn news_api_url(&self) -> CoreResult<Url> {
        Url::parse(&self.news_api_url).map_err(CoreError::from)
    }

    /// Get the identity provider URL as a parsed URL.
    pub fn identity_url(&self) -> CoreResult<Url> {
        Url::parse(&self.identity_url).map_err(CoreError::from)
    }

    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
