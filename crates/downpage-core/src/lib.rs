//! Downpage Core - Release data and page composition for app download pages.
//!
//! This crate fetches release metadata from the GitHub REST API, caches it
//! with a fixed TTL, and fills an HTML template with it. It can be used
//! without any HTTP server; see the `downpage-server` crate for the routes.
//!
//! # Example
//!
//! ```rust,ignore
//! use downpage_core::{AccessorConfig, GitHubClient, SiteConfiguration, SiteService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> downpage_core::Result<()> {
//!     let github = Arc::new(GitHubClient::new(AccessorConfig::from_env())?);
//!     let site = SiteService::new(Arc::new(SiteConfiguration::builtin()?), github);
//!
//!     println!("Current release: {}", site.tag_name().await?);
//!     println!("Total downloads: {}", site.download_count().await?);
//!     Ok(())
//! }
//! ```

pub mod badge;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod page;
pub mod site;

// Re-export commonly used types
pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use config::{AccessorConfig, AppConfig, NetworkConfig};
pub use error::{DownpageError, Result};
pub use models::{Asset, PrivacyPolicy, Release, ReleaseSummary, SiteConfiguration};
pub use network::GitHubClient;
pub use page::{PageComposer, PageConfiguration, PageRequest, PageRoute};
pub use site::SiteService;
