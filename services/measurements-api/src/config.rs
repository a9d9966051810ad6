//! Measurements API configuration loading.
//!
//! Values come from the environment; an optional YAML file overrides them.
//!
//! ```yaml
//! search:
//!   url: http://localhost:9200
//!   timeout_secs: 10
//! cities:
//!   default: 10
//!   max: 500
//! ```

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use measurement_query::CityLimits;
use search_client::SearchConfig;

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Search engine connection
    #[serde(default)]
    pub search: SearchConfig,

    /// Bounds of the `cities` listing parameter
    #[serde(default)]
    pub cities: CityLimits,
}

impl ApiConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = CityLimits::default();

        Self {
            search: SearchConfig::from_env(),
            cities: CityLimits {
                default: env_parse("MEASUREMENTS_DEFAULT_CITIES").unwrap_or(defaults.default),
                max: env_parse("MEASUREMENTS_MAX_CITIES").unwrap_or(defaults.max),
            },
        }
    }

    /// Environment configuration, overridden by `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_over(Self::from_env(), path)
    }

    fn load_over(base: Self, path: Option<&Path>) -> Result<Self> {
        let config = match path {
            None => base,
            Some(path) if !path.exists() => {
                warn!(
                    "Config file {} does not exist, using environment",
                    path.display()
                );
                base
            }
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read: {:?}", path))?;
                let overlay: ConfigOverlay = serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse: {:?}", path))?;
                info!(path = %path.display(), "Loaded configuration file");
                overlay.apply(base)
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cities.default == 0 || self.cities.default > self.cities.max {
            anyhow::bail!(
                "cities.default must be between 1 and cities.max ({}), got {}",
                self.cities.max,
                self.cities.default
            );
        }
        Ok(())
    }
}

/// File shape: every key optional, present keys replace the environment value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverlay {
    #[serde(default)]
    search: SearchOverlay,
    #[serde(default)]
    cities: CitiesOverlay,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchOverlay {
    url: Option<String>,
    index_prefix: Option<String>,
    timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    max_index_target_len: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CitiesOverlay {
    default: Option<usize>,
    max: Option<usize>,
}

impl ConfigOverlay {
    fn apply(self, mut config: ApiConfig) -> ApiConfig {
        let search = &mut config.search;
        if let Some(url) = self.search.url {
            search.url = url;
        }
        if let Some(prefix) = self.search.index_prefix {
            search.index_prefix = prefix;
        }
        if let Some(secs) = self.search.timeout_secs {
            search.timeout_secs = secs;
        }
        if let Some(secs) = self.search.connect_timeout_secs {
            search.connect_timeout_secs = secs;
        }
        if let Some(len) = self.search.max_index_target_len {
            search.max_index_target_len = len;
        }

        if let Some(default) = self.cities.default {
            config.cities.default = default;
        }
        if let Some(max) = self.cities.max {
            config.cities.max = max;
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
