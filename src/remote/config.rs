use crate::core::{Result, StoreError};
use reqwest::Url;
use std::fmt;
use std::time::Duration;

pub const ENV_URL: &str = "SHOPDESK_URL";
pub const ENV_KEY: &str = "SHOPDESK_KEY";
pub const ENV_TIMEOUT_SECS: &str = "SHOPDESK_TIMEOUT_SECS";
pub const ENV_SCHEMA: &str = "SHOPDESK_SCHEMA";

/// Remote store connection settings
///
/// Holds the project URL and the public (anon) API key of the hosted service.
#[derive(Clone)]
pub struct StoreConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`
    pub url: String,

    /// Public API key sent with every request
    pub api_key: String,

    /// Database schema exposed over REST
    pub schema: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl StoreConfig {
    /// Create a new store configuration
    pub fn new(url: &str, api_key: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            schema: "public".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the exposed schema
    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read configuration from the process environment
    ///
    /// `SHOPDESK_URL` and `SHOPDESK_KEY` are required; `SHOPDESK_TIMEOUT_SECS`
    /// and `SHOPDESK_SCHEMA` are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`StoreConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| StoreError::Config(format!("{} is not set", ENV_URL)))?;
        let api_key = lookup(ENV_KEY)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| StoreError::Config(format!("{} is not set", ENV_KEY)))?;

        let mut config = Self::new(url.trim(), api_key.trim());

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                StoreError::Config(format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))
            })?;
            config = config.timeout(Duration::from_secs(secs));
        }

        if let Some(schema) = lookup(ENV_SCHEMA).filter(|s| !s.trim().is_empty()) {
            config = config.schema(schema.trim());
        }

        config.validate()?;
        Ok(config)
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.url)
            .map_err(|e| StoreError::Config(format!("invalid store URL '{}': {}", self.url, e)))
    }

    /// True when the URL parses as http(s) and a key is present.
    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StoreError::Config(format!(
                "store URL must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.api_key.is_empty() {
            return Err(StoreError::Config("API key cannot be empty".to_string()));
        }

        if self.timeout.is_zero() {
            return Err(StoreError::Config("timeout must be > 0".to_string()));
        }

        Ok(())
    }
}

// Keys never reach logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"***")
            .field("schema", &self.schema)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_builder_pattern() {
        let config = StoreConfig::new("https://shop.example.com/", "anon")
            .schema("store")
            .timeout(Duration::from_secs(5));

        assert_eq!(config.url, "https://shop.example.com");
        assert_eq!(config.schema, "store");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.is_configured());
    }

    #[test]
    fn test_from_lookup() {
        let config = StoreConfig::from_lookup(env(&[
            (ENV_URL, "https://abc.supabase.co"),
            (ENV_KEY, "anon-key"),
            (ENV_TIMEOUT_SECS, "10"),
        ]))
        .unwrap();

        assert_eq!(config.url, "https://abc.supabase.co");
        assert_eq!(config.api_key, "anon-key");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.schema, "public");
    }

    #[test]
    fn test_missing_or_invalid_env() {
        assert!(matches!(
            StoreConfig::from_lookup(env(&[(ENV_KEY, "k")])),
            Err(StoreError::Config(_))
        ));
        assert!(StoreConfig::from_lookup(env(&[(ENV_URL, "not a url"), (ENV_KEY, "k")])).is_err());
        assert!(
            StoreConfig::from_lookup(env(&[
                (ENV_URL, "https://abc.supabase.co"),
                (ENV_KEY, "k"),
                (ENV_TIMEOUT_SECS, "soon"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn test_validate_rejects_non_http() {
        assert!(!StoreConfig::new("ftp://files.example.com", "k").is_configured());
        assert!(!StoreConfig::new("https://abc.supabase.co", "").is_configured());
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", StoreConfig::new("https://abc.supabase.co", "secret"));
        assert!(!rendered.contains("secret"));
    }
}
