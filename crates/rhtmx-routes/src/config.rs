// File: src/config.rs
// Purpose: Configuration parsing from routes.toml

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::registry::RouteDescriptor;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    /// Route declarations, registered in file order
    #[serde(default)]
    pub routes: Vec<RouteDescriptor>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// Registry-wide routing settings
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Default locale (e.g. "en")
    #[serde(default)]
    pub locale: Option<String>,

    /// Redirect `/` to the visitor's locale when no route matches it
    #[serde(default = "default_false")]
    pub force_locale: bool,

    /// Absolute site URL exposed to renderers (canonical links, sitemaps)
    #[serde(default)]
    pub site_url: Option<String>,
}

impl RoutingConfig {
    /// Settings with only a default locale
    pub fn with_locale(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            ..Self::default()
        }
    }

    pub fn force_locale(mut self, force_locale: bool) -> Self {
        self.force_locale = force_locale;
        self
    }

    pub fn site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = Some(site_url.into());
        self
    }
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_false() -> bool {
    false
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Self::from_toml(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from default path (./routes.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("routes.toml")
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.routing.locale, None);
        assert!(!config.routing.force_locale);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load("does/not/exist/routes.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_routes_section() {
        let toml = r#"
            [routing]
            locale = "en"
            force_locale = true
            site_url = "https://example.com"

            [[routes]]
            name = "post"
            locale = "en"
            pattern = "/en/posts/:id"
            page = "Post"
            middleware = ["auth", "analytics"]
            data = { title = "Post", weight = 2 }

            [[routes]]
            name = "about"
        "#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.routing.locale.as_deref(), Some("en"));
        assert!(config.routing.force_locale);
        assert_eq!(config.routing.site_url.as_deref(), Some("https://example.com"));
        assert_eq!(config.routes.len(), 2);

        let post = &config.routes[0];
        assert_eq!(post.pattern.as_deref(), Some("/en/posts/:id"));
        let data = post.data.as_ref().unwrap();
        assert_eq!(data.get("title"), Some(&json!("Post")));
        assert_eq!(data.get("weight"), Some(&json!(2)));
        assert_eq!(
            post.middleware.as_ref().and_then(|m| m.as_array()).map(Vec::len),
            Some(2)
        );

        let about = &config.routes[1];
        assert_eq!(about.locale, None);
        assert_eq!(about.pattern, None);
        assert!(!about.update);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::from_toml("[[routes]]\nname = 3").is_err());
    }
}
