//! GitHub release data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub download_count: u64,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// One published version of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    /// `None` for drafts.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Changelog text.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    /// Assets in upstream order.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Sum of download counters over this release's assets.
    pub fn total_downloads(&self) -> u64 {
        self.assets.iter().map(|a| a.download_count).sum()
    }

    /// The asset served by `/download`.
    pub fn first_asset(&self) -> Option<&Asset> {
        self.assets.first()
    }
}

/// Sum of every asset's download counter across `releases`.
pub fn total_download_count(releases: &[Release]) -> u64 {
    releases.iter().map(Release::total_downloads).sum()
}

/// Release facts the page composer merges into a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSummary {
    pub tag_name: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Size of the first asset in bytes.
    pub size: Option<u64>,
    /// Downloads across every release of the repository.
    pub downloads: u64,
}
