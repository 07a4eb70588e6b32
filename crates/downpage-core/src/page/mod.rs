//! Page composition.
//!
//! A page is the HTML template with its placeholders filled for one route
//! and status code. Release data is fetched by the caller and handed in, so
//! composing never performs I/O beyond reading a template file at startup.

mod composer;
mod configuration;

pub use composer::{
    escape_html, PageComposer, CONFIGURATION_PLACEHOLDER, DESCRIPTION_PLACEHOLDER,
    THEME_COLOR_PLACEHOLDER, TITLE_PLACEHOLDER,
};
pub use configuration::PageConfiguration;

/// Logical pages served from the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRoute {
    Home,
    PrivacyPolicy,
}

impl PageRoute {
    pub fn path(&self) -> &'static str {
        match self {
            PageRoute::Home => "/",
            PageRoute::PrivacyPolicy => "/privacy-policy",
        }
    }
}

/// What to render: route, status code and the prefix the site is mounted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub route: PageRoute,
    pub status: u16,
    pub base_path: String,
}

impl PageRequest {
    pub fn new(route: PageRoute, status: u16, base_path: impl Into<String>) -> Self {
        Self {
            route,
            status,
            base_path: base_path.into(),
        }
    }

    /// An error page; the route only matters for status 200.
    pub fn error(status: u16, base_path: impl Into<String>) -> Self {
        Self::new(PageRoute::Home, status, base_path)
    }
}
