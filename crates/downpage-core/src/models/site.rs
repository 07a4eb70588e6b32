//! Site configuration supplied by the embedding application.

use crate::error::{DownpageError, Result};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration shipped with the crate, used when none is supplied.
const BUILTIN_SITE_JSON: &str = include_str!("../../assets/default_site.json");

/// Everything the download page needs to know about the app it serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfiguration {
    pub application: Application,
    pub developer: Developer,
    pub site: SiteStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_policy: Option<PrivacyPolicy>,
}

/// Application metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    /// Pins the page to one release instead of following the latest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,
    /// Overrides the first release asset as the `/download` target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Repository as `owner/repo`.
    pub github: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bugs: Option<String>,
    pub info: ApplicationInfo,
    /// Extra string or number fields appended to `/about.json`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub about_json: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_requirement: Option<String>,
    #[serde(deserialize_with = "date_or_datetime")]
    pub released_on: NaiveDate,
}

/// Developer identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Developer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Site styling and navigation links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStyle {
    /// Theme color, `#rrggbb`.
    pub primary_color: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<SiteLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLink {
    pub name: String,
    pub href: String,
}

/// Privacy policy: an external URL or an inline document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrivacyPolicy {
    Link(String),
    Document(PrivacyDocument),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyDocument {
    #[serde(deserialize_with = "date_or_datetime")]
    pub last_updated: NaiveDate,
    pub body: Vec<PolicySection>,
}

/// One heading of the privacy policy. Content lines are markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySection {
    pub heading: String,
    pub content: Vec<String>,
}

impl SiteConfiguration {
    /// The configuration shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_SITE_JSON)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SiteConfiguration = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DownpageError::io_with_path(e, path))?;
        Self::from_json_str(&contents)
    }

    /// The tracked repository, `owner/repo`.
    pub fn repository(&self) -> &str {
        &self.application.github
    }

    /// Check the fields the rest of the system relies on.
    pub fn validate(&self) -> Result<()> {
        validate_repository(&self.application.github)?;

        if !self.site.primary_color.starts_with('#') {
            return Err(DownpageError::Config {
                message: format!(
                    "site.primaryColor must start with '#', got '{}'",
                    self.site.primary_color
                ),
            });
        }

        if let Some((key, _)) = self
            .application
            .about_json
            .iter()
            .find(|(_, value)| !(value.is_string() || value.is_number()))
        {
            return Err(DownpageError::Config {
                message: format!("application.aboutJson.{} must be a string or number", key),
            });
        }

        Ok(())
    }
}

/// Check that `repo` has the `owner/repo` shape.
pub fn validate_repository(repo: &str) -> Result<()> {
    let mut parts = repo.split('/');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(owner), Some(name), None)
            if !owner.is_empty() && !name.is_empty() && !repo.contains(char::is_whitespace)
    );
    if valid {
        Ok(())
    } else {
        Err(DownpageError::Config {
            message: format!("repository must be 'owner/repo', got '{}'", repo),
        })
    }
}

/// Accept `2023-11-01` as well as full timestamps such as the ones
/// `JSON.stringify(new Date())` produces.
fn date_or_datetime<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(&raw).map(|dt| dt.date_naive()))
        .map_err(|_| serde::de::Error::custom(format!("invalid date '{}'", raw)))
}
