//! HTML page composition by placeholder substitution.

use super::configuration::PageConfiguration;
use super::{PageRequest, PageRoute};
use crate::models::{ReleaseSummary, SiteConfiguration};
use crate::{DownpageError, Result};
use std::path::Path;

/// Page shell shipped with the crate.
const BUILTIN_TEMPLATE: &str = include_str!("../../assets/index.html");

pub const TITLE_PLACEHOLDER: &str = "__SITE_TITLE__";
pub const DESCRIPTION_PLACEHOLDER: &str = "__SITE_DESCRIPTION__";
pub const THEME_COLOR_PLACEHOLDER: &str = "__SITE_THEME_COLOR__";
pub const CONFIGURATION_PLACEHOLDER: &str = "__SITE_CONFIGURATION__";

/// Fills the page template for a route and status.
///
/// Stateless apart from the template itself, so one composer is shared by
/// every request.
#[derive(Debug, Clone)]
pub struct PageComposer {
    template: String,
}

impl PageComposer {
    /// Use `template` as the page shell.
    ///
    /// The template must contain `__SITE_CONFIGURATION__`.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(CONFIGURATION_PLACEHOLDER) {
            return Err(DownpageError::Config {
                message: format!("Page template has no {} placeholder", CONFIGURATION_PLACEHOLDER),
            });
        }
        Ok(Self { template })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let template =
            std::fs::read_to_string(path).map_err(|e| DownpageError::io_with_path(e, path))?;
        Self::new(template)
    }

    pub fn builtin() -> Self {
        Self {
            template: BUILTIN_TEMPLATE.to_string(),
        }
    }

    /// Render a page.
    ///
    /// `release` is merged into the configuration blob of successful pages
    /// and ignored for error pages.
    pub fn compose(
        &self,
        site: &SiteConfiguration,
        request: &PageRequest,
        release: Option<&ReleaseSummary>,
    ) -> Result<String> {
        let mut configuration = PageConfiguration::new(site, &request.base_path, request.status)?;

        let (title, description) = match request.status {
            200 => {
                if let Some(release) = release {
                    configuration = configuration.with_release(release)?;
                }
                match request.route {
                    PageRoute::Home => (
                        format!("{} - {}", site.application.name, site.developer.name),
                        site.application.description.clone(),
                    ),
                    PageRoute::PrivacyPolicy => ("Privacy Policy".to_string(), String::new()),
                }
            }
            404 => ("404 - Page Not Found".to_string(), String::new()),
            500 => ("500 - Internal Server Error".to_string(), String::new()),
            code => (format!("{} - An Error Occurred", code), String::new()),
        };

        let encoded = configuration.encode()?;
        let page = self
            .template
            .replace(TITLE_PLACEHOLDER, &escape_html(&title))
            .replace(DESCRIPTION_PLACEHOLDER, &escape_html(&description))
            .replace(THEME_COLOR_PLACEHOLDER, &escape_html(&site.site.primary_color))
            .replacen(CONFIGURATION_PLACEHOLDER, &encoded, 1);

        Ok(page)
    }

    /// Render an error page. Never fetches release data.
    pub fn compose_error(
        &self,
        site: &SiteConfiguration,
        status: u16,
        base_path: &str,
    ) -> Result<String> {
        self.compose(site, &PageRequest::error(status, base_path), None)
    }
}

impl Default for PageComposer {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Escape text for element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn site() -> SiteConfiguration {
        SiteConfiguration::builtin().unwrap()
    }

    fn release() -> ReleaseSummary {
        ReleaseSummary {
            tag_name: "v2.0.0".into(),
            published_at: Some(Utc.with_ymd_and_hms(2025, 8, 28, 10, 0, 0).unwrap()),
            size: Some(4096),
            downloads: 1234,
        }
    }

    fn embedded_configuration(page: &str) -> serde_json::Value {
        let start = page.find("decodeURIComponent(\"").unwrap() + "decodeURIComponent(\"".len();
        let end = start + page[start..].find('"').unwrap();
        let decoded = urlencoding::decode(&page[start..end]).unwrap();
        serde_json::from_str(&decoded).unwrap()
    }

    #[test]
    fn test_home_page() {
        let composer = PageComposer::builtin();
        let page = composer
            .compose(&site(), &PageRequest::new(PageRoute::Home, 200, ""), Some(&release()))
            .unwrap();

        assert!(page.contains("<title>PEC Events App - Gideon Jacob</title>"));
        assert!(page.contains(r##"content="#03875F""##));

        let config = embedded_configuration(&page);
        assert_eq!(config["application"]["downloads"], 1234);
        assert_eq!(config["application"]["tagName"], "v2.0.0");
        assert_eq!(config["site"]["statusCode"], 200);
    }

    #[test]
    fn test_privacy_policy_page() {
        let page = PageComposer::builtin()
            .compose(
                &site(),
                &PageRequest::new(PageRoute::PrivacyPolicy, 200, "/app"),
                Some(&release()),
            )
            .unwrap();

        assert!(page.contains("<title>Privacy Policy</title>"));
        assert!(page.contains(r#"<meta name="description" content="" />"#));

        let config = embedded_configuration(&page);
        assert_eq!(config["application"]["downloads"], 1234);
        assert_eq!(config["site"]["basePath"], "/app");
    }

    #[test]
    fn test_error_titles() {
        let composer = PageComposer::builtin();
        let cases = [
            (404, "404 - Page Not Found"),
            (500, "500 - Internal Server Error"),
            (418, "418 - An Error Occurred"),
        ];

        for (status, title) in cases {
            let page = composer.compose_error(&site(), status, "").unwrap();
            assert!(page.contains(&format!("<title>{}</title>", title)), "{}", status);

            let config = embedded_configuration(&page);
            assert_eq!(config["site"]["statusCode"], status);
            assert!(config["application"].get("downloads").is_none());
        }
    }

    #[test]
    fn test_error_page_ignores_release_data() {
        let page = PageComposer::builtin()
            .compose(&site(), &PageRequest::error(500, ""), Some(&release()))
            .unwrap();
        let config = embedded_configuration(&page);
        assert!(config["application"].get("downloads").is_none());
    }

    #[test]
    fn test_no_placeholder_left() {
        let composer = PageComposer::builtin();
        let pages = [
            composer
                .compose(&site(), &PageRequest::new(PageRoute::Home, 200, ""), Some(&release()))
                .unwrap(),
            composer.compose_error(&site(), 404, "").unwrap(),
        ];

        for page in pages {
            assert!(!page.contains("__SITE_"), "unreplaced placeholder in {}", page);
        }
    }

    #[test]
    fn test_values_are_escaped() {
        let mut site = site();
        site.application.name = "<script>alert(1)</script>".into();
        let page = PageComposer::builtin()
            .compose(&site, &PageRequest::new(PageRoute::Home, 200, ""), None)
            .unwrap();

        assert!(!page.contains("<script>alert(1)"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt; - Gideon Jacob"));
    }

    #[test]
    fn test_template_must_carry_configuration() {
        assert!(PageComposer::new("<title>__SITE_TITLE__</title>").is_err());
        assert!(PageComposer::new("<p>__SITE_CONFIGURATION__</p>").is_ok());
    }

    #[test]
    fn test_configuration_replaced_once() {
        let composer = PageComposer::new("__SITE_CONFIGURATION__|__SITE_CONFIGURATION__").unwrap();
        let page = composer.compose_error(&site(), 404, "").unwrap();
        assert!(page.ends_with("|__SITE_CONFIGURATION__"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "<title>__SITE_TITLE__</title>__SITE_CONFIGURATION__").unwrap();

        let page = PageComposer::from_file(&path)
            .unwrap()
            .compose_error(&site(), 404, "")
            .unwrap();
        assert!(page.starts_with("<title>404 - Page Not Found</title>"));
    }
}
