//! Provider configuration
//!
//! Connection, retry and pagination settings for the DataForSEO client.

use crate::fetcher::RetryPolicy;
use crate::request::MAX_LIMIT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default provider API root
pub const DEFAULT_BASE_URL: &str = "https://api.dataforseo.com";

/// Configuration for the DataForSEO client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API root, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Basic auth login
    #[serde(default)]
    pub login: String,

    /// Basic auth password
    #[serde(default)]
    pub password: String,

    /// Default location code (2840 = United States)
    #[serde(default = "default_location_code")]
    pub location_code: u32,

    /// Default language code
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base in milliseconds (doubles per attempt)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Records requested per page (provider maximum is 1000)
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Upper bound on pages fetched per call
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_location_code() -> u32 {
    2840
}

fn default_language_code() -> String {
    "en".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_attempt_timeout_secs() -> u64 {
    30
}

fn default_page_limit() -> usize {
    MAX_LIMIT
}

fn default_max_pages() -> usize {
    5
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login: String::new(),
            password: String::new(),
            location_code: default_location_code(),
            language_code: default_language_code(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            page_limit: default_page_limit(),
            max_pages: default_max_pages(),
        }
    }
}

impl ProviderConfig {
    /// Create a configuration with the given credentials and defaults elsewhere
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Create an aggressive configuration: one retry, short timeouts, a single page
    pub fn aggressive() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 200,
            attempt_timeout_secs: 10,
            max_pages: 1,
            ..Default::default()
        }
    }

    /// Create a lenient configuration for large pulls: patient retries, more pages
    pub fn lenient() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1000,
            attempt_timeout_secs: 60,
            max_pages: 20,
            ..Default::default()
        }
    }

    /// Whether credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.login.is_empty() && !self.password.is_empty()
    }

    /// Retry policy derived from this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
        }
    }

    /// Full URL for an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }

        if self.language_code.trim().is_empty() {
            return Err("language_code must not be empty".to_string());
        }

        if self.page_limit == 0 || self.page_limit > MAX_LIMIT {
            return Err(format!(
                "page_limit must be between 1 and {}, got {}",
                MAX_LIMIT, self.page_limit
            ));
        }

        if self.max_pages == 0 {
            return Err("max_pages must be at least 1".to_string());
        }

        if self.attempt_timeout_secs == 0 {
            return Err("attempt_timeout_secs must be at least 1".to_string());
        }

        Ok(())
    }

    /// Load from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.location_code, 2840);
        assert_eq!(config.language_code, "en");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.page_limit, 1000);
        assert!(!config.has_credentials());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(ProviderConfig::aggressive().validate().is_ok());
        assert!(ProviderConfig::lenient().validate().is_ok());
        assert!(ProviderConfig::aggressive().max_retries < ProviderConfig::lenient().max_retries);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = ProviderConfig {
            page_limit: 1001,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ProviderConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ProviderConfig {
            max_pages: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_conversion() {
        let policy = ProviderConfig::default().retry_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.attempt_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ProviderConfig {
            base_url: "http://127.0.0.1:8080/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint("/v3/backlinks/referring_domains/live"),
            "http://127.0.0.1:8080/v3/backlinks/referring_domains/live"
        );
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ProviderConfig::new("user@example.com", "secret");
        let toml_str = config.to_toml().unwrap();
        let parsed = ProviderConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ProviderConfig::from_toml("login = \"me\"\nmax_retries = 1\n").unwrap();
        assert_eq!(parsed.login, "me");
        assert_eq!(parsed.max_retries, 1);
        assert_eq!(parsed.location_code, 2840);
        assert_eq!(parsed.max_pages, 5);
    }
}
