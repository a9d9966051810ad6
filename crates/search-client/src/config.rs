//! Search engine connection configuration.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use measurement_query::DEFAULT_SERIES_PREFIX;

/// Configuration for the search engine connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the engine's REST API
    #[serde(default = "default_url")]
    pub url: String,

    /// Series prefix of the yearly partitions
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Longest comma-joined index list sent in a request path before
    /// falling back to the series wildcard
    #[serde(default = "default_max_index_target_len")]
    pub max_index_target_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            index_prefix: default_index_prefix(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_index_target_len: default_max_index_target_len(),
        }
    }
}

fn default_url() -> String {
    "http://es01:9200".to_string()
}

fn default_index_prefix() -> String {
    DEFAULT_SERIES_PREFIX.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_max_index_target_len() -> usize {
    // Engine default for the HTTP request line is 4kb
    3072
}

impl SearchConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            url: env::var("ES_URL").unwrap_or(defaults.url),
            index_prefix: env::var("ES_INDEX_PREFIX").unwrap_or(defaults.index_prefix),
            timeout_secs: env_parse("ES_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            connect_timeout_secs: env_parse("ES_CONNECT_TIMEOUT_SECS")
                .unwrap_or(defaults.connect_timeout_secs),
            max_index_target_len: env_parse("ES_MAX_INDEX_TARGET_LEN")
                .unwrap_or(defaults.max_index_target_len),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
