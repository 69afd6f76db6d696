//! Configuration for SparkPost clients.
//!
//! A [`SparkPostConfig`] holds the API key and the endpoint settings shared by every
//! resource. It can be built in code or loaded from the `SPARKPOST_API_KEY` and
//! `SPARKPOST_BASE_URI` environment variables.

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use validator::{Validate, ValidationError};

/// Default API host (US region).
pub const DEFAULT_BASE_URI: &str = "https://api.sparkpost.com";

/// API host for the EU region.
pub const EU_BASE_URI: &str = "https://api.eu.sparkpost.com";

/// Default API version.
pub const DEFAULT_API_VERSION: u8 = 1;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "SPARKPOST_API_KEY";

/// Environment variable overriding the API host.
pub const BASE_URI_ENV: &str = "SPARKPOST_BASE_URI";

/// Settings for connecting to the SparkPost API.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SparkPostConfig {
    /// API key sent in the `Authorization` header
    pub api_key: SecretString,

    /// API host, including scheme
    #[validate(url)]
    #[serde(default = "default_base_uri")]
    pub base_uri: String,

    /// API version, used to build the `/api/v{version}` prefix
    #[validate(range(min = 1, max = 9))]
    #[serde(default = "default_api_version")]
    pub api_version: u8,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for idempotent requests; zero sends every request once
    #[validate(range(min = 0, max = 10))]
    #[serde(default)]
    pub max_retries: u32,
}

fn default_base_uri() -> String {
    DEFAULT_BASE_URI.to_string()
}

const fn default_api_version() -> u8 {
    DEFAULT_API_VERSION
}

const fn default_request_timeout_secs() -> u64 {
    30
}

fn validate_api_key(key: &SecretString) -> std::result::Result<(), ValidationError> {
    if key.expose_secret().trim().is_empty() {
        return Err(ValidationError::new("empty_api_key"));
    }
    Ok(())
}

impl SparkPostConfig {
    /// Create a configuration for the default US endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let config = Self {
            api_key: SecretString::from(api_key.into()),
            base_uri: default_base_uri(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: 0,
        };
        config.check()?;
        Ok(config)
    }

    /// Load the configuration from `SPARKPOST_API_KEY` and `SPARKPOST_BASE_URI`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the key is missing or a value is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration using a custom variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the key is missing or a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::ConfigError(format!("{API_KEY_ENV} is not set")))?;

        let mut config = Self::new(api_key)?;
        if let Some(base_uri) = lookup(BASE_URI_ENV).filter(|uri| !uri.trim().is_empty()) {
            config = config.with_base_uri(base_uri);
            config.check()?;
        }
        Ok(config)
    }

    /// Set the API host. A bare host name gets an `https://` scheme.
    #[must_use]
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        let base_uri = base_uri.into();
        self.base_uri = if base_uri.contains("://") {
            base_uri
        } else {
            format!("https://{base_uri}")
        };
        self
    }

    /// Set the API version.
    #[must_use]
    pub const fn with_api_version(mut self, version: u8) -> Self {
        self.api_version = version;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set the number of retries for idempotent requests.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate every field, mapping failures to [`Error::ConfigError`].
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field set.
    pub fn check(&self) -> Result<()> {
        validate_api_key(&self.api_key)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: api_key: {e}")))?;
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Versioned API root, e.g. `https://api.sparkpost.com/api/v1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URI cannot be parsed.
    pub fn api_url(&self) -> Result<Url> {
        let root = format!(
            "{}/api/v{}",
            self.base_uri.trim_end_matches('/'),
            self.api_version
        );
        Url::parse(&root).map_err(|e| Error::ConfigError(format!("Invalid base URI: {e}")))
    }
}
