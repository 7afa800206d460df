use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::replace::FadeTimings;

/// Knobs for the client. Every field has a default matching the stock server
/// module, so an empty TOML file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LazyViewsConfig {
    /// Origin the endpoint path is resolved against.
    pub base_url: String,
    pub endpoint: String,
    pub placeholder_class: String,
    pub processed_class: String,
    pub cache_id_attribute: String,
    pub spinner_class: String,
    pub fade_out_ms: u64,
    pub fade_in_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LazyViewsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/".to_string(),
            endpoint: "/lazy-views/ajax".to_string(),
            placeholder_class: "lazy-views-placeholder".to_string(),
            processed_class: "processed".to_string(),
            cache_id_attribute: "data-lazy-views-cache-id".to_string(),
            spinner_class: "lazy-views-spinner".to_string(),
            fade_out_ms: 500,
            fade_in_ms: 600,
            timeout_secs: 30,
            user_agent: concat!("lazyviews/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl LazyViewsConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Absolute endpoint URL.
    pub fn endpoint_url(&self) -> Result<String, ConfigError> {
        let invalid = |source| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            source,
        };
        let base = Url::parse(&self.base_url).map_err(invalid)?;
        Ok(base.join(&self.endpoint).map_err(invalid)?.to_string())
    }

    /// Selector for placeholders that have not been claimed yet.
    pub fn unprocessed_selector(&self) -> String {
        format!(".{}:not(.{})", self.placeholder_class, self.processed_class)
    }

    pub fn fade_timings(&self) -> FadeTimings {
        FadeTimings {
            fade_out: Duration::from_millis(self.fade_out_ms),
            fade_in: Duration::from_millis(self.fade_in_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
