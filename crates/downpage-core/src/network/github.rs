//! GitHub release accessor with TTL caching.
//!
//! Provides:
//! - Latest release, release by tag, and full release history
//! - Total download count across every release
//! - Per-URL response caching with a fixed TTL and periodic sweep
//! - Bounded retries for transient upstream failures
//!
//! Only successful responses are cached. Concurrent misses for the same URL
//! each go to the network.

use crate::cache::{spawn_housekeeping, Clock, SystemClock, TtlCache};
use crate::config::{AccessorConfig, NetworkConfig};
use crate::models::{total_download_count, validate_repository, Release};
use crate::network::client::HttpClient;
use crate::network::retry::{retry_async, RetryConfig};
use crate::{DownpageError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// GitHub release accessor.
pub struct GitHubClient {
    http: HttpClient,
    cache: Arc<TtlCache<Value>>,
    retry: RetryConfig,
    api_base: String,
    config: AccessorConfig,
}

impl GitHubClient {
    /// Create an accessor backed by the system clock.
    pub fn new(config: AccessorConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an accessor whose cache reads time from `clock`.
    pub fn with_clock(config: AccessorConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let api_base = config.api_base.trim_end_matches('/').to_string();
        Url::parse(&api_base).map_err(|e| DownpageError::Config {
            message: format!("Invalid API base URL '{}': {}", api_base, e),
        })?;

        let http = HttpClient::new(&config)?;
        let retry = RetryConfig::new()
            .with_max_retries(config.max_retries)
            .with_base_delay(config.retry_base_delay);

        Ok(Self {
            http,
            cache: Arc::new(TtlCache::with_clock(config.cache_ttl, clock)),
            retry,
            api_base,
            config,
        })
    }

    /// The response cache.
    pub fn cache(&self) -> &Arc<TtlCache<Value>> {
        &self.cache
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Start the periodic sweep of expired cache entries.
    pub fn spawn_housekeeping(&self) -> JoinHandle<()> {
        spawn_housekeeping(self.cache.clone(), self.config.sweep_interval)
    }

    /// The most recent published release.
    pub async fn latest_release(&self, repo: &str) -> Result<Release> {
        validate_repository(repo)?;
        let url = format!("{}/repos/{}/releases/latest", self.api_base, repo);
        self.get_cached(&url).await
    }

    /// The release whose tag is `tag`.
    ///
    /// An unknown tag surfaces as an upstream 404 like any other upstream
    /// failure; see [`DownpageError::is_not_found`].
    pub async fn release_by_tag(&self, repo: &str, tag: &str) -> Result<Release> {
        validate_repository(repo)?;
        let url = format!(
            "{}/repos/{}/releases/tags/{}",
            self.api_base,
            repo,
            urlencoding::encode(tag)
        );
        self.get_cached(&url).await
    }

    /// Every release of `repo`, most recent first, in upstream order.
    ///
    /// Reads at most `GITHUB_RELEASES_MAX_PAGES` pages. Releases past the
    /// cap are not returned, and a warning is logged when it is reached.
    pub async fn all_releases(&self, repo: &str) -> Result<Vec<Release>> {
        validate_repository(repo)?;
        let per_page = NetworkConfig::GITHUB_RELEASES_PER_PAGE;
        let max_pages = NetworkConfig::GITHUB_RELEASES_MAX_PAGES;
        let mut all_releases = Vec::new();

        for page in 1..=max_pages {
            let url = format!(
                "{}/repos/{}/releases?per_page={}&page={}",
                self.api_base, repo, per_page, page
            );
            let releases: Vec<Release> = self.get_cached(&url).await?;
            let count = releases.len();
            all_releases.extend(releases);

            // A short page is the last one
            if count < per_page as usize {
                return Ok(all_releases);
            }
        }

        warn!(
            "Release history of {} exceeds {} pages, only the first {} releases are counted",
            repo,
            max_pages,
            all_releases.len()
        );
        Ok(all_releases)
    }

    /// Sum of every asset's download counter across every release.
    ///
    /// Fails as a whole if any page of the history cannot be fetched.
    /// Bounded by the page cap of [`GitHubClient::all_releases`].
    pub async fn download_count(&self, repo: &str) -> Result<u64> {
        let releases = self.all_releases(repo).await?;
        Ok(total_download_count(&releases))
    }

    // Internal methods

    async fn get_cached<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        if let Some(value) = self.cache.get(url) {
            debug!("Cache hit for {}", url);
            return decode(url, value);
        }

        debug!("Cache miss for {}", url);
        let value = self.fetch(url).await?;
        // Decode before caching so a malformed body is never stored
        let decoded = decode(url, value.clone())?;
        self.cache.insert(url, value);
        Ok(decoded)
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        let http = &self.http;
        let (result, stats) = retry_async(
            &self.retry,
            || http.get_json(url),
            DownpageError::is_retryable,
        )
        .await;

        if stats.attempts > 1 {
            debug!("{} finished after {} attempts", url, stats.attempts);
        }
        let value = result?;

        if let Some(releases) = value.as_array() {
            info!("Fetched {} releases from {}", releases.len(), url);
        } else {
            info!("Fetched {}", url);
        }
        Ok(value)
    }
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| DownpageError::Json {
        message: format!("Unexpected response shape from {}: {}", url, e),
        source: Some(e),
    })
}
