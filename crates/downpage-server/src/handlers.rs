//! Route handlers.
//!
//! Every failure is answered with an HTML error page rendered through the
//! same template as successful pages.

use crate::server::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use downpage_core::badge::{downloads_badge, release_badge};
use downpage_core::{DownpageError, PageRequest, PageRoute, PrivacyPolicy};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// `GET /`
pub async fn handle_home(State(state): State<Arc<AppState>>) -> Response {
    render_page(&state, PageRoute::Home).await
}

/// `GET /privacy-policy`
pub async fn handle_privacy_policy(State(state): State<Arc<AppState>>) -> Response {
    match state.site.privacy_policy() {
        Ok(PrivacyPolicy::Link(url)) => redirect(&state, url),
        Ok(PrivacyPolicy::Document(_)) => render_page(&state, PageRoute::PrivacyPolicy).await,
        Err(e) => {
            debug!("{}", e);
            error_page(&state, status_for(&e))
        }
    }
}

/// `GET /download`
pub async fn handle_download(State(state): State<Arc<AppState>>) -> Response {
    match state.site.download_url().await {
        Ok(url) => redirect(&state, &url),
        Err(e) => failure(&state, "download", e),
    }
}

/// `GET /about.json`
pub async fn handle_about(State(state): State<Arc<AppState>>) -> Response {
    match state.site.about().await {
        Ok(about) => Json(about).into_response(),
        Err(e) => failure(&state, "about.json", e),
    }
}

/// `GET /release.svg`
pub async fn handle_release_badge(State(state): State<Arc<AppState>>) -> Response {
    match state.site.tag_name().await {
        Ok(tag) => svg(release_badge(&tag)),
        Err(e) => failure(&state, "release badge", e),
    }
}

/// `GET /downloads.svg`
pub async fn handle_downloads_badge(State(state): State<Arc<AppState>>) -> Response {
    match state.site.download_count().await {
        Ok(count) => svg(downloads_badge(count)),
        Err(e) => failure(&state, "downloads badge", e),
    }
}

/// Any path no other route or static file matched.
pub async fn handle_not_found(State(state): State<Arc<AppState>>) -> Response {
    error_page(&state, StatusCode::NOT_FOUND)
}

async fn render_page(state: &AppState, route: PageRoute) -> Response {
    let release = match state.site.page_data().await {
        Ok(release) => release,
        Err(e) => return failure(state, route.path(), e),
    };

    let request = PageRequest::new(route, 200, state.base_path.as_str());
    match state
        .composer
        .compose(state.site.config(), &request, Some(&release))
    {
        Ok(page) => Html(page).into_response(),
        Err(e) => failure(state, route.path(), e),
    }
}

fn failure(state: &AppState, what: &str, err: DownpageError) -> Response {
    error!("Failed to serve {}: {}", what, err);
    error_page(state, status_for(&err))
}

fn status_for(err: &DownpageError) -> StatusCode {
    StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_page(state: &AppState, status: StatusCode) -> Response {
    match state
        .composer
        .compose_error(state.site.config(), status.as_u16(), &state.base_path)
    {
        Ok(page) => (status, Html(page)).into_response(),
        Err(e) => {
            error!("Failed to render {} page: {}", status.as_u16(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "500 - Internal Server Error").into_response()
        }
    }
}

fn redirect(state: &AppState, location: &str) -> Response {
    match header::HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            error!("Refusing to redirect to invalid location '{}'", location);
            error_page(state, StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn svg(body: String) -> Response {
    ([(header::CONTENT_TYPE, SVG_CONTENT_TYPE)], body).into_response()
}
