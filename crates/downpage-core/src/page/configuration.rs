//! The configuration blob embedded into every composed page.

use crate::badge::format_size;
use crate::models::{PrivacyPolicy, ReleaseSummary, SiteConfiguration};
use crate::{DownpageError, Result};
use chrono::NaiveDate;
use serde_json::{json, Map, Value};

const SHORT_DATE: &str = "%b %-d, %Y";
const LONG_DATE: &str = "%B %-d, %Y";

/// Site configuration extended with display strings, request context and,
/// for successful pages, release data.
#[derive(Debug, Clone, PartialEq)]
pub struct PageConfiguration(Value);

impl PageConfiguration {
    /// Extend `site` with the fields every page carries.
    pub fn new(site: &SiteConfiguration, base_path: &str, status: u16) -> Result<Self> {
        let mut value = serde_json::to_value(site).map_err(|e| DownpageError::Render {
            message: format!("Failed to serialize site configuration: {}", e),
        })?;

        let released_on = short_date(site.application.info.released_on);
        object_at(&mut value, &["application", "info"])?
            .insert("releasedOnString".into(), json!(released_on));

        let site_obj = object_at(&mut value, &["site"])?;
        site_obj.insert("basePath".into(), json!(base_path));
        site_obj.insert("statusCode".into(), json!(status));

        if let Some(PrivacyPolicy::Document(doc)) = &site.privacy_policy {
            let last_updated = doc.last_updated.format(LONG_DATE).to_string();
            object_at(&mut value, &["privacyPolicy"])?
                .insert("lastUpdatedString".into(), json!(last_updated));
        }

        Ok(Self(value))
    }

    /// Merge release facts into the application section.
    pub fn with_release(mut self, release: &ReleaseSummary) -> Result<Self> {
        let application = object_at(&mut self.0, &["application"])?;
        if let Some(size) = release.size.filter(|size| *size > 0) {
            application.insert("size".into(), json!(size));
            application.insert("sizeString".into(), json!(format_size(size)));
        }
        application.insert("downloads".into(), json!(release.downloads));
        application.insert("tagName".into(), json!(release.tag_name));

        if let Some(published_at) = release.published_at {
            let updated_on = short_date(published_at.date_naive());
            object_at(&mut self.0, &["application", "info"])?
                .insert("updatedOnString".into(), json!(updated_on));
        }

        Ok(self)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Percent-encoded JSON, ready for `decodeURIComponent` on the client.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_string(&self.0).map_err(|e| DownpageError::Render {
            message: format!("Failed to serialize page configuration: {}", e),
        })?;
        Ok(urlencoding::encode(&json).into_owned())
    }
}

fn short_date(date: NaiveDate) -> String {
    date.format(SHORT_DATE).to_string()
}

fn object_at<'a>(value: &'a mut Value, path: &[&str]) -> Result<&'a mut Map<String, Value>> {
    let mut current = value;
    for key in path {
        current = current.get_mut(*key).ok_or_else(|| DownpageError::Render {
            message: format!("Page configuration has no '{}' section", key),
        })?;
    }
    current.as_object_mut().ok_or_else(|| DownpageError::Render {
        message: format!("Page configuration section '{}' is not an object", path.join(".")),
    })
}
