//! Release resolution for the configured application.
//!
//! [`SiteService`] ties a [`SiteConfiguration`] to the release accessor and
//! answers the questions the routes ask: which tag is current, where the
//! download lives, what goes into `/about.json`.

use crate::models::{PrivacyPolicy, Release, ReleaseSummary, SiteConfiguration};
use crate::network::GitHubClient;
use crate::{DownpageError, Result};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Release lookups for one configured application.
#[derive(Clone)]
pub struct SiteService {
    config: Arc<SiteConfiguration>,
    github: Arc<GitHubClient>,
}

impl SiteService {
    pub fn new(config: Arc<SiteConfiguration>, github: Arc<GitHubClient>) -> Self {
        Self { config, github }
    }

    pub fn config(&self) -> &SiteConfiguration {
        &self.config
    }

    fn repo(&self) -> &str {
        self.config.repository()
    }

    fn pinned_tag(&self) -> Option<&str> {
        self.config.application.tag_name.as_deref()
    }

    /// The pinned tag if one is configured, otherwise the latest release's.
    pub async fn tag_name(&self) -> Result<String> {
        match self.pinned_tag() {
            Some(tag) => Ok(tag.to_string()),
            None => Ok(self.github.latest_release(self.repo()).await?.tag_name),
        }
    }

    /// The release the page presents.
    pub async fn release(&self) -> Result<Release> {
        match self.pinned_tag() {
            Some(tag) => {
                debug!("Using pinned release {}", tag);
                self.github.release_by_tag(self.repo(), tag).await
            }
            None => self.github.latest_release(self.repo()).await,
        }
    }

    /// The configured privacy policy, `NotConfigured` when there is none.
    pub fn privacy_policy(&self) -> Result<&PrivacyPolicy> {
        self.config
            .privacy_policy
            .as_ref()
            .ok_or_else(|| DownpageError::NotConfigured {
                what: "privacy policy".to_string(),
            })
    }

    /// Downloads across every release of the repository.
    pub async fn download_count(&self) -> Result<u64> {
        self.github.download_count(self.repo()).await
    }

    /// Target of `/download`.
    pub async fn download_url(&self) -> Result<String> {
        if let Some(link) = &self.config.application.download_link {
            return Ok(link.clone());
        }

        let release = self.release().await?;
        release
            .first_asset()
            .map(|asset| asset.download_url.clone())
            .ok_or(DownpageError::MissingAsset {
                tag: release.tag_name,
            })
    }

    /// Body of `/about.json`.
    ///
    /// Keys from `aboutJson` are applied last and win over the computed ones.
    pub async fn about(&self) -> Result<Value> {
        let tag_name = self.tag_name().await?;
        let release = self.release().await?;
        let downloads = self.download_count().await?;

        let mut about = Map::new();
        about.insert("downloads".into(), json!(downloads));
        about.insert("updatedOn".into(), json!(release.published_at));
        about.insert("releaseNotes".into(), json!(release.body));
        about.insert("tagName".into(), json!(tag_name));
        for (key, value) in &self.config.application.about_json {
            about.insert(key.clone(), value.clone());
        }

        Ok(Value::Object(about))
    }

    /// Release facts merged into composed pages.
    pub async fn page_data(&self) -> Result<ReleaseSummary> {
        let release = self.release().await?;
        let downloads = self.download_count().await?;

        Ok(ReleaseSummary {
            tag_name: self
                .pinned_tag()
                .map(String::from)
                .unwrap_or_else(|| release.tag_name.clone()),
            published_at: release.published_at,
            size: release.first_asset().map(|asset| asset.size),
            downloads,
        })
    }
}
