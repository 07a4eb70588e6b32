//! HTTP client for the release-hosting API.
//!
//! Wraps reqwest with:
//! - GitHub default headers and user agent
//! - Optional bearer token on every request
//! - A fixed request timeout
//! - Rate limit tracking from response headers
//! - Uniform conversion of failures into `DownpageError::Upstream`

use crate::config::{AccessorConfig, NetworkConfig};
use crate::{DownpageError, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tracing::{debug, warn};

/// Rate limit state extracted from response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Remaining requests allowed.
    pub remaining: Option<u64>,
    /// Total request limit.
    pub limit: Option<u64>,
    /// Unix timestamp when the rate limit resets.
    pub reset: Option<u64>,
}

impl RateLimitState {
    /// Whether fewer than 10% of the quota is left.
    pub fn is_low(&self) -> bool {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) if limit > 0 => {
                let threshold = (limit / 10).max(1);
                remaining < threshold
            }
            _ => false,
        }
    }
}

/// HTTP client used by the release accessor.
pub struct HttpClient {
    client: Client,
    token: Option<String>,
    rate_limit_remaining: AtomicI64,
    rate_limit_limit: AtomicU64,
    rate_limit_reset: AtomicU64,
}

impl HttpClient {
    /// Create a client from accessor settings.
    pub fn new(config: &AccessorConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(NetworkConfig::GITHUB_ACCEPT),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(NetworkConfig::GITHUB_API_VERSION),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| DownpageError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            token: config.token.clone(),
            rate_limit_remaining: AtomicI64::new(-1),
            rate_limit_limit: AtomicU64::new(0),
            rate_limit_reset: AtomicU64::new(0),
        })
    }

    /// Whether requests carry a bearer token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Get the last observed rate limit state.
    pub fn rate_limit_state(&self) -> RateLimitState {
        let remaining = self.rate_limit_remaining.load(Ordering::SeqCst);
        let limit = self.rate_limit_limit.load(Ordering::SeqCst);
        let reset = self.rate_limit_reset.load(Ordering::SeqCst);
        RateLimitState {
            remaining: u64::try_from(remaining).ok(),
            limit: (limit > 0).then_some(limit),
            reset: (reset > 0).then_some(reset),
        }
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// Non-success statuses and transport failures both become
    /// `DownpageError::Upstream`.
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        debug!("GET {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| DownpageError::transport(url, &e))?;

        self.update_rate_limits(&response);
        let response = check_response_status(response, url).await?;

        let text = response
            .text()
            .await
            .map_err(|e| DownpageError::transport(url, &e))?;
        serde_json::from_str(&text).map_err(|e| DownpageError::Json {
            message: format!("Failed to parse response from {}: {}", url, e),
            source: Some(e),
        })
    }

    fn update_rate_limits(&self, response: &Response) {
        let headers = response.headers();

        if let Some(num) = header_number::<i64>(headers, "X-RateLimit-Remaining") {
            self.rate_limit_remaining.store(num, Ordering::SeqCst);
        }
        if let Some(num) = header_number::<u64>(headers, "X-RateLimit-Limit") {
            self.rate_limit_limit.store(num, Ordering::SeqCst);
        }
        if let Some(num) = header_number::<u64>(headers, "X-RateLimit-Reset") {
            self.rate_limit_reset.store(num, Ordering::SeqCst);
        }

        let state = self.rate_limit_state();
        if let (Some(remaining), Some(limit)) = (state.remaining, state.limit) {
            debug!("Rate limit: {}/{}", remaining, limit);
            if state.is_low() {
                warn!(
                    "Upstream rate limit nearly exhausted ({}/{} left{})",
                    remaining,
                    limit,
                    if self.is_authenticated() {
                        ""
                    } else {
                        ", set GITHUB_TOKEN for a higher limit"
                    }
                );
            }
        }
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

async fn check_response_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // GitHub reports errors as {"message": "...", "documentation_url": "..."}
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

    Err(DownpageError::Upstream {
        url: url.to_string(),
        status_code: Some(status.as_u16()),
        message,
    })
}
