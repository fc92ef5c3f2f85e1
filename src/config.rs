//! API configuration
//!
//! Settings for reaching the locations API, read from the environment with
//! defaults, and overridable from the command line.

use serde::{Deserialize, Serialize};

/// Configuration for the locations API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the API
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Data source queried when none is given
    #[serde(default = "default_data_source")]
    pub data_source: String,
}

fn default_api_url() -> String {
    "https://api.ddrfinder.app/v4".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_data_source() -> String {
    "ziv".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_secs: default_timeout(),
            data_source: default_data_source(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `DDRFINDER_API_URL` | API base URL |
    /// | `DDRFINDER_API_TIMEOUT` | Request timeout in seconds |
    /// | `DDRFINDER_DATA_SOURCE` | Default data source key |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            url: lookup("DDRFINDER_API_URL").unwrap_or_else(default_api_url),
            timeout_secs: lookup("DDRFINDER_API_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            data_source: lookup("DDRFINDER_DATA_SOURCE")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_data_source),
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the default data source.
    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = data_source.into();
        self
    }
}
