//! Centralized configuration for the download page.
//!
//! Network constants live in [`NetworkConfig`]; the runtime values handed to
//! the release accessor live in [`AccessorConfig`].

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "downpage";
    pub const DEFAULT_PORT: u16 = 3000;
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const MAX_RETRIES: u32 = 2;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
    pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);
    pub const USER_AGENT: &'static str = "pec-events-app-download-page";
    pub const GITHUB_API_BASE: &'static str = "https://api.github.com";
    pub const GITHUB_ACCEPT: &'static str = "application/vnd.github+json";
    pub const GITHUB_API_VERSION: &'static str = "2022-11-28";
    pub const GITHUB_RELEASES_PER_PAGE: u32 = 100;
    pub const GITHUB_RELEASES_MAX_PAGES: u32 = 10;
    pub const GITHUB_RELEASES_TTL: Duration = Duration::from_secs(6 * 60 * 60);
    pub const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
    /// Environment variables checked for an access token, in order.
    pub const TOKEN_ENV_VARS: [&'static str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];
}

/// Runtime settings for the release accessor.
#[derive(Debug, Clone)]
pub struct AccessorConfig {
    /// Base URL of the release-hosting API, without trailing slash.
    pub api_base: String,
    /// Bearer token attached to every request when present.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_base_delay: Duration,
    /// Lifetime of a cached response.
    pub cache_ttl: Duration,
    /// Period of the expired-entry sweep.
    pub sweep_interval: Duration,
}

impl Default for AccessorConfig {
    fn default() -> Self {
        Self {
            api_base: NetworkConfig::GITHUB_API_BASE.to_string(),
            token: None,
            timeout: NetworkConfig::REQUEST_TIMEOUT,
            max_retries: NetworkConfig::MAX_RETRIES,
            retry_base_delay: NetworkConfig::RETRY_BASE_DELAY,
            cache_ttl: NetworkConfig::GITHUB_RELEASES_TTL,
            sweep_interval: NetworkConfig::CACHE_SWEEP_INTERVAL,
        }
    }
}

impl AccessorConfig {
    /// Default settings with the token taken from the process environment.
    pub fn from_env() -> Self {
        Self {
            token: token_from_env(),
            ..Self::default()
        }
    }

    /// Set the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set or clear the access token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget and first retry delay.
    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    /// Set the cache time-to-live.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the housekeeping interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Resolve an access token from the environment.
///
/// Checks `GITHUB_TOKEN` first, then `GH_TOKEN`. Blank values are skipped.
pub fn token_from_env() -> Option<String> {
    NetworkConfig::TOKEN_ENV_VARS.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        let config = AccessorConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.cache_ttl, Duration::from_secs(21_600));
        assert_eq!(config.sweep_interval, Duration::from_secs(3_600));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_builder_trims_base_and_blank_token() {
        let config = AccessorConfig::default()
            .with_api_base("http://127.0.0.1:1234/")
            .with_token(Some("   ".to_string()));
        assert_eq!(config.api_base, "http://127.0.0.1:1234");
        assert!(config.token.is_none());

        let config = config.with_token(Some("abc".to_string()));
        assert_eq!(config.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_timing_setters() {
        let config = AccessorConfig::default()
            .with_timeout(Duration::from_secs(3))
            .with_cache_ttl(Duration::from_secs(60))
            .with_sweep_interval(Duration::from_secs(15));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.sweep_interval, Duration::from_secs(15));
    }
}
