//! Connection settings for the remote catalog.

use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://rickandmortyapi.com/api";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "CATALOG_API_URL";

/// Environment variable holding a request timeout in whole seconds.
pub const TIMEOUT_ENV: &str = "CATALOG_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Base URL; `/episode` and `/character` are appended to it.
    pub api_url: String,
    /// Per-request timeout handed to the transport. `None` means no limit.
    pub timeout: Option<Duration>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: None,
        }
    }
}

impl CatalogConfig {
    /// Defaults overridden by `CATALOG_API_URL` and `CATALOG_TIMEOUT_SECS`.
    /// A timeout that is not a positive integer is ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.api_url = url.trim().to_string();
        }
        config.timeout = lookup(TIMEOUT_ENV)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        config
    }
}
