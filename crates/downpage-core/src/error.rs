//! Error types for the download page library.
//!
//! Every failure the accessor, composer or site layer can produce is a
//! variant of [`DownpageError`]. The route layer only needs
//! [`DownpageError::http_status`] to decide between a 404 and a 500 page.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the download page library.
#[derive(Debug, Error)]
pub enum DownpageError {
    // Remote API errors
    #[error("Upstream request to {url} failed{}: {message}", status_suffix(.status_code))]
    Upstream {
        url: String,
        /// HTTP status returned by the upstream, `None` for transport failures.
        status_code: Option<u16>,
        message: String,
    },

    // Page errors
    #[error("Not configured: {what}")]
    NotConfigured { what: String },

    #[error("Release {tag} has no downloadable assets")]
    MissingAsset { tag: String },

    #[error("Render error: {message}")]
    Render { message: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

fn status_suffix(status_code: &Option<u16>) -> String {
    status_code
        .map(|code| format!(" with status {}", code))
        .unwrap_or_default()
}

/// Result type alias for download page operations.
pub type Result<T> = std::result::Result<T, DownpageError>;

impl From<std::io::Error> for DownpageError {
    fn from(err: std::io::Error) -> Self {
        DownpageError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for DownpageError {
    fn from(err: serde_json::Error) -> Self {
        DownpageError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl DownpageError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        DownpageError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Build an upstream error from a transport-level reqwest failure.
    pub fn transport(url: &str, err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        DownpageError::Upstream {
            url: url.to_string(),
            status_code: None,
            message,
        }
    }

    /// Upstream status code, if the error came from a remote response.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            DownpageError::Upstream { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Whether the upstream answered 404.
    ///
    /// Unknown tags and unknown repositories are both reported this way;
    /// callers that care can tell them apart from other upstream failures.
    pub fn is_not_found(&self) -> bool {
        self.upstream_status() == Some(404)
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            DownpageError::Upstream {
                status_code: None, ..
            } => true,
            DownpageError::Upstream {
                status_code: Some(code),
                ..
            } => matches!(code, 408 | 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// HTTP status the route layer answers with for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            DownpageError::NotConfigured { .. } => 404,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(status_code: Option<u16>) -> DownpageError {
        DownpageError::Upstream {
            url: "https://api.github.com/repos/a/b/releases/latest".into(),
            status_code,
            message: "Not Found".into(),
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            upstream(Some(404)).to_string(),
            "Upstream request to https://api.github.com/repos/a/b/releases/latest failed with status 404: Not Found"
        );
        assert_eq!(
            upstream(None).to_string(),
            "Upstream request to https://api.github.com/repos/a/b/releases/latest failed: Not Found"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(upstream(None).is_retryable());
        assert!(upstream(Some(503)).is_retryable());
        assert!(upstream(Some(429)).is_retryable());
        assert!(!upstream(Some(404)).is_retryable());
        assert!(!upstream(Some(401)).is_retryable());
        assert!(!DownpageError::Render {
            message: "x".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            DownpageError::NotConfigured {
                what: "privacy policy".into()
            }
            .http_status(),
            404
        );
        assert_eq!(upstream(Some(404)).http_status(), 500);
        assert_eq!(
            DownpageError::MissingAsset { tag: "v1".into() }.http_status(),
            500
        );
    }

    #[test]
    fn test_not_found_classification() {
        assert!(upstream(Some(404)).is_not_found());
        assert!(!upstream(Some(500)).is_not_found());
        assert!(!upstream(None).is_not_found());
    }
}
