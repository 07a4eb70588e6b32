//! Integration tests for the downpage binary.
//!
//! Each test starts the real server against a mock release API and talks to
//! it over HTTP, the way a browser or a README badge would.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncBufReadExt;

const SITE_JSON: &str = r##"{
    "application": {
        "name": "Demo",
        "description": "Demo app",
        "github": "octo/demo",
        "aboutJson": { "minSdk": 21 },
        "info": { "releasedOn": "2023-11-01" }
    },
    "developer": { "name": "Octo" },
    "site": { "primaryColor": "#112233" }
}"##;

const LATEST: &str = r#"{
    "tag_name": "v2.0.0",
    "published_at": "2025-08-28T10:00:00Z",
    "body": "Latest notes",
    "assets": [
        {"name": "app.apk", "size": 2048, "download_count": 5,
         "browser_download_url": "https://github.com/octo/demo/releases/download/v2.0.0/app.apk"}
    ]
}"#;

const RELEASES: &str = r#"[
    {"tag_name": "v2.0.0", "published_at": "2025-08-28T10:00:00Z",
     "assets": [{"name": "a", "size": 1, "download_count": 5, "browser_download_url": "u"}]},
    {"tag_name": "v1.0.0", "published_at": "2024-01-15T08:30:00Z",
     "assets": [{"name": "b", "size": 1, "download_count": 3, "browser_download_url": "u"},
                {"name": "c", "size": 1, "download_count": 2, "browser_download_url": "u"}]}
]"#;

/// Write the site configuration into a scratch directory.
fn create_site_config() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(temp_dir.path().join("site.json"), SITE_JSON).unwrap();
    temp_dir
}

/// Check health endpoint.
async fn check_health(port: u16) -> bool {
    let client = reqwest::Client::new();
    if let Ok(response) = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        if let Ok(json) = response.json::<Value>().await {
            return json.get("status").and_then(|v| v.as_str()) == Some("ok");
        }
    }
    false
}

/// Wait for server to be ready.
async fn wait_for_server(port: u16, timeout_secs: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(timeout_secs) {
        if check_health(port).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

struct ServerHandle {
    child: tokio::process::Child,
    port: u16,
    stdout_drain: Option<tokio::task::JoinHandle<()>>,
}

impl ServerHandle {
    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    async fn stop(mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.start_kill();
    }
}

/// Start the downpage binary and wait until `/health` is ready.
async fn start_downpage(config: &Path, api_base: &str) -> Result<ServerHandle, String> {
    let binary = env!("CARGO_BIN_EXE_downpage");

    let mut child = tokio::process::Command::new(binary)
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg("0")
        .arg("--config")
        .arg(config)
        .arg("--api-base")
        .arg(api_base)
        .env_remove("GITHUB_TOKEN")
        .env_remove("GH_TOKEN")
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("failed to spawn downpage: {e}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to capture stdout".to_string())?;
    let mut lines = tokio::io::BufReader::new(stdout).lines();

    let mut discovered_port: Option<u16> = None;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(250), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(value) = line.strip_prefix("DOWNPAGE_PORT=") {
                    let parsed = value
                        .trim()
                        .parse::<u16>()
                        .map_err(|e| format!("invalid DOWNPAGE_PORT value '{value}': {e}"))?;
                    discovered_port = Some(parsed);
                    break;
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(format!("failed to read downpage stdout: {err}")),
            Err(_) => continue,
        }
    }

    let port =
        discovered_port.ok_or_else(|| "DOWNPAGE_PORT line not emitted by downpage".to_string())?;
    if !wait_for_server(port, 15).await {
        return Err(format!("downpage failed health check on port {port}"));
    }

    let stdout_drain =
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

    Ok(ServerHandle {
        child,
        port,
        stdout_drain: Some(stdout_drain),
    })
}

async fn mock_upstream(server: &mut ServerGuard) -> (mockito::Mock, mockito::Mock) {
    let latest = server
        .mock("GET", "/repos/octo/demo/releases/latest")
        .with_status(200)
        .with_body(LATEST)
        .expect(1)
        .create_async()
        .await;
    let releases = server
        .mock("GET", "/repos/octo/demo/releases")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(RELEASES)
        .expect(1)
        .create_async()
        .await;
    (latest, releases)
}

fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_routes_served_from_cached_upstream() {
    let mut upstream = Server::new_async().await;
    let (latest, releases) = mock_upstream(&mut upstream).await;
    let config_dir = create_site_config();

    let server = start_downpage(&config_dir.path().join("site.json"), &upstream.url())
        .await
        .expect("server should start");
    let client = no_redirect_client();

    let about: Value = client
        .get(server.url("/about.json"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(about["downloads"], 10);
    assert_eq!(about["tagName"], "v2.0.0");
    assert_eq!(about["minSdk"], 21);

    let home = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(home.status(), 200);
    assert!(home.text().await.unwrap().contains("<title>Demo - Octo</title>"));

    let download = client.get(server.url("/download")).send().await.unwrap();
    assert_eq!(download.status(), 302);
    assert_eq!(
        download.headers()["location"],
        "https://github.com/octo/demo/releases/download/v2.0.0/app.apk"
    );

    let badge = client.get(server.url("/downloads.svg")).send().await.unwrap();
    assert_eq!(badge.status(), 200);
    assert_eq!(badge.headers()["content-type"], "image/svg+xml");

    // Every route above was answered from one fetch per upstream URL
    latest.assert_async().await;
    releases.assert_async().await;

    server.stop().await;
}

#[tokio::test]
async fn test_missing_pages_are_404() {
    let upstream = Server::new_async().await;
    let config_dir = create_site_config();

    let server = start_downpage(&config_dir.path().join("site.json"), &upstream.url())
        .await
        .expect("server should start");
    let client = no_redirect_client();

    let privacy = client.get(server.url("/privacy-policy")).send().await.unwrap();
    assert_eq!(privacy.status(), 404);

    let unknown = client.get(server.url("/nope")).send().await.unwrap();
    assert_eq!(unknown.status(), 404);
    assert!(unknown
        .text()
        .await
        .unwrap()
        .contains("<title>404 - Page Not Found</title>"));

    server.stop().await;
}

#[tokio::test]
async fn test_upstream_failure_is_500() {
    let mut upstream = Server::new_async().await;
    upstream
        .mock("GET", "/repos/octo/demo/releases/latest")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;
    let config_dir = create_site_config();

    let server = start_downpage(&config_dir.path().join("site.json"), &upstream.url())
        .await
        .expect("server should start");

    let response = no_redirect_client()
        .get(server.url("/release.svg"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("<title>500 - Internal Server Error</title>"));

    server.stop().await;
}

#[tokio::test]
async fn test_invalid_config_fails_to_start() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("site.json");
    std::fs::write(&path, SITE_JSON.replace("octo/demo", "not-a-repo")).unwrap();

    let status = tokio::process::Command::new(env!("CARGO_BIN_EXE_downpage"))
        .arg("--port")
        .arg("0")
        .arg("--config")
        .arg(&path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .unwrap();
    assert!(!status.success());
}
