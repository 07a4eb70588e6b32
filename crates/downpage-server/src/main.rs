//! Downpage - HTTP server for a GitHub-hosted app's download page.
//!
//! Serves the templated download page, the `/download` redirect,
//! `/about.json` and the release/download badges for one repository.

use anyhow::{Context, Result};
use clap::Parser;
use downpage_core::{
    AccessorConfig, AppConfig, GitHubClient, NetworkConfig, PageComposer, SiteConfiguration,
    SiteService,
};
use downpage_server::{start_server, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "downpage")]
#[command(about = "Download page server for a GitHub-hosted app")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value_t = AppConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = AppConfig::DEFAULT_HOST)]
    host: String,

    /// Site configuration JSON (defaults to the built-in configuration)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTML template containing the page placeholders
    #[arg(long)]
    template: Option<PathBuf>,

    /// Directory of static assets served for unmatched paths
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Path prefix the site is mounted under
    #[arg(long, default_value = "")]
    base_path: String,

    /// Release API base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Seconds release data stays cached
    #[arg(long, default_value_t = NetworkConfig::GITHUB_RELEASES_TTL.as_secs())]
    cache_ttl: u64,

    /// Seconds between sweeps of expired cache entries
    #[arg(long, default_value_t = NetworkConfig::CACHE_SWEEP_INTERVAL.as_secs())]
    sweep_interval: u64,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = NetworkConfig::REQUEST_TIMEOUT.as_secs())]
    request_timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_logging(debug: bool, json: bool) {
    let level = if debug { "debug" } else { "info" };
    // RUST_LOG wins over --debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,downpage={0},downpage_server={0},downpage_core={0},tower_http={0}",
            level
        ))
    });

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.log_json);

    info!("Starting {}", AppConfig::APP_NAME);

    let site = match &args.config {
        Some(path) => SiteConfiguration::from_file(path)
            .with_context(|| format!("Failed to load site configuration {}", path.display()))?,
        None => SiteConfiguration::builtin()?,
    };
    info!("Serving releases of {}", site.repository());

    let composer = match &args.template {
        Some(path) => PageComposer::from_file(path)
            .with_context(|| format!("Failed to load page template {}", path.display()))?,
        None => PageComposer::builtin(),
    };

    let mut accessor = AccessorConfig::from_env()
        .with_cache_ttl(Duration::from_secs(args.cache_ttl))
        .with_sweep_interval(Duration::from_secs(args.sweep_interval))
        .with_timeout(Duration::from_secs(args.request_timeout));
    if let Some(api_base) = args.api_base {
        accessor = accessor.with_api_base(api_base);
    }
    let github = Arc::new(GitHubClient::new(accessor)?);
    if !github.http().is_authenticated() {
        info!("No GITHUB_TOKEN or GH_TOKEN set, upstream requests are unauthenticated");
    }
    info!("Caching release data for {:?}", github.cache().ttl());
    github.spawn_housekeeping();

    let state = AppState::new(SiteService::new(Arc::new(site), github), composer)
        .with_base_path(&args.base_path)
        .with_static_dir(args.static_dir);

    let addr = start_server(Arc::new(state), &args.host, args.port).await?;

    // Print port for supervising processes to read (intentional stdout)
    println!("DOWNPAGE_PORT={}", addr.port());

    info!("Download page running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
