//! HTTP server implementation using Axum.

use crate::handlers::{
    handle_about, handle_download, handle_downloads_badge, handle_health, handle_home,
    handle_not_found, handle_privacy_policy, handle_release_badge,
};
use axum::{handler::Handler, routing::get, Router};
use downpage_core::{PageComposer, SiteService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Release lookups for the configured application
    pub site: SiteService,
    /// Page template
    pub composer: PageComposer,
    /// Prefix the routes are mounted under, empty for the root
    pub base_path: String,
    /// Directory of static assets served for unmatched paths
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(site: SiteService, composer: PageComposer) -> Self {
        Self {
            site,
            composer,
            base_path: String::new(),
            static_dir: None,
        }
    }

    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_base_path(base_path);
        self
    }

    pub fn with_static_dir(mut self, static_dir: Option<PathBuf>) -> Self {
        self.static_dir = static_dir;
        self
    }
}

/// `"app/"` becomes `"/app"`; `""` and `"/"` become `""`.
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Build the router for every page, badge and JSON route.
pub fn build_router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/", get(handle_home))
        .route("/privacy-policy", get(handle_privacy_policy))
        .route("/download", get(handle_download))
        .route("/about.json", get(handle_about))
        .route("/release.svg", get(handle_release_badge))
        .route("/downloads.svg", get(handle_downloads_badge))
        .route("/health", get(handle_health));

    let routes = match &state.static_dir {
        Some(dir) => {
            let not_found = handle_not_found.with_state(state.clone());
            routes.fallback_service(
                ServeDir::new(dir)
                    .append_index_html_on_directories(false)
                    .fallback(not_found),
            )
        }
        None => routes.fallback(handle_not_found),
    };

    let app = if state.base_path.is_empty() {
        routes
    } else {
        Router::new()
            .nest(&state.base_path, routes)
            .fallback(handle_not_found)
    };

    // about.json and the badges are fetched from other origins
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}
