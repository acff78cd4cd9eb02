//! Engine configuration, stored as TOML.
//!
//! ```toml
//! url = "https://example.com"
//! clean_urls = true
//! post_url = "(year)/(month)/(day)/(url)/"
//! enabled_modules = ["comments", "categorize"]
//!
//! [[routes]]
//! pattern = "/"
//! action = "page;url=home"
//! ```
//!
//! `routes` is the persisted custom-route table, in resolution order.

use lectern_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One persisted custom route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// The route pattern, e.g. `category/(name)/`.
    pub pattern: String,
    /// The expansion, e.g. `category` or `page;url=home`.
    pub action: String,
}

impl RouteConfig {
    /// Create a route entry.
    pub fn new(pattern: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            action: action.into(),
        }
    }
}

/// Site-level settings the engine reads at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The site base URL.
    pub url: String,
    /// Emit links in clean form.
    pub clean_urls: bool,
    /// The post URL pattern.
    pub post_url: String,
    /// Items per page for regular listings.
    pub posts_per_page: usize,
    /// Items per feed.
    pub feed_items: usize,
    /// Enabled modules, in load order.
    pub enabled_modules: Vec<String>,
    /// Enabled feathers, in load order.
    pub enabled_feathers: Vec<String>,
    /// Custom routes, in resolution order.
    pub routes: Vec<RouteConfig>,
}

/// The default post URL pattern.
pub const DEFAULT_POST_URL: &str = "(year)/(month)/(day)/(url)/";

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            clean_urls: true,
            post_url: DEFAULT_POST_URL.to_string(),
            posts_per_page: 10,
            feed_items: 20,
            enabled_modules: Vec::new(),
            enabled_feathers: Vec::new(),
            routes: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing or blank file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, &path.display().to_string())
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(content).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            source: Box::new(e),
        })
    }

    /// Serialize to TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Serialize(Box::new(e)))
    }

    /// Write the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;

        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Whether a custom route serves the site root.
    pub fn enable_homepage(&self) -> bool {
        self.routes.iter().any(|route| route.pattern == "/")
    }

    /// Every enabled extension: modules first, then feathers.
    pub fn enabled_extensions(&self) -> impl Iterator<Item = &str> {
        self.enabled_modules
            .iter()
            .chain(&self.enabled_feathers)
            .map(String::as_str)
    }
}
