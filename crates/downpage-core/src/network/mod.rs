//! Network access to the release-hosting API.
//!
//! This module provides:
//! - HTTP client with GitHub headers and rate limit awareness
//! - Retry logic with exponential backoff and jitter
//! - Cached GitHub release accessor

mod client;
mod github;
mod retry;

pub use client::{HttpClient, RateLimitState};
pub use github::GitHubClient;
pub use retry::{retry_async, RetryConfig, RetryStats};
