//! Configuration types for collection runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::errors::ConfigurationError;

/// How the runner reacts to an item that fails to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Record the failure and keep evaluating the other items (default).
    #[default]
    ContinueOnFailure,
    /// Abort the remaining items and fail the run on the first item error.
    FailFast,
}

/// Configuration for HTTP fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum response size in bytes.
    #[serde(default = "default_max_size")]
    pub max_response_size: usize,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout() -> f64 {
    30.0
}

fn default_user_agent() -> String {
    format!("scrapeflow/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            max_response_size: default_max_size(),
            headers: HashMap::new(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Gets timeout as Duration.
    ///
    /// # Errors
    ///
    /// Returns an error unless the timeout is a positive, representable
    /// number of seconds.
    pub fn timeout(&self) -> Result<Duration, ConfigurationError> {
        let invalid =
            |reason: &str| ConfigurationError::invalid_value("fetch.timeout_seconds", reason);
        if self.timeout_seconds.is_nan() || self.timeout_seconds <= 0.0 {
            return Err(invalid("must be a positive number of seconds"));
        }
        Duration::try_from_secs_f64(self.timeout_seconds).map_err(|e| invalid(&e.to_string()))
    }
}

/// Configuration of one collection run.
///
/// Collectors receive this as their `config`; `url` doubles as the base for
/// resolving relative links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// URL of the root listing document.
    pub url: String,
    /// Transport settings.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Per-item failure handling.
    #[serde(default)]
    pub failure_mode: FailureMode,
    /// Evaluate at most this many anchors of the listing.
    #[serde(default)]
    pub max_items: Option<usize>,
}

impl CollectionConfig {
    /// Creates a configuration for the given listing URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fetch: FetchConfig::default(),
            failure_mode: FailureMode::default(),
            max_items: None,
        }
    }

    /// Sets the fetch configuration.
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Sets the failure mode.
    #[must_use]
    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Limits the number of evaluated anchors.
    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::new(format!("Invalid collection config: {e}")))?;
        config.fetch.timeout()?;
        Ok(config)
    }

    /// Reads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::new(format!("Cannot read config {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }
}
