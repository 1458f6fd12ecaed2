use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use sitesnap_core::config::{AuthConfig, UserConfig};
use sitesnap_core::{
    AdminApp, Capability, DirectoryInventorySource, DynClock, FixedClock, InventoryCollector,
    TokenService,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    let plugins = dir.path().join("wp-content").join("plugins");
    let themes = dir.path().join("wp-content").join("themes");

    write(
        &plugins.join("acme").join("acme.php"),
        "<?php\n/*\n * Plugin Name: Acme, \"Pro\" Edition\n * Version: 2.0\n * Author: Acme\n */\n",
    );
    write(
        &plugins.join("zeta.php"),
        "<?php\n/* Plugin Name: zeta tools\nVersion: 0.1 */\n",
    );
    write(
        &themes.join("astra").join("style.css"),
        "/*\nTheme Name: Astra\nVersion: 4.6.1\nAuthor: Brainstorm Force\n*/\n",
    );
    write(
        &dir.path().join("sitesnap-state.toml"),
        "active_plugins = [\"acme/acme.php\"]\nstylesheet = \"astra\"\n",
    );
    dir
}

fn router(root: &Path) -> Router {
    let at = Utc.with_ymd_and_hms(2024, 8, 1, 9, 30, 0).unwrap();
    let clock: DynClock = Arc::new(FixedClock(at));
    let tokens = Arc::new(TokenService::new(
        b"flow-secret".to_vec(),
        Duration::hours(24),
        clock.clone(),
    ));
    let collector = InventoryCollector::new(Arc::new(DirectoryInventorySource::new(root)));

    let auth = AuthConfig {
        users: vec![UserConfig {
            name: "admin".to_string(),
            api_key: "admin-key".to_string(),
            capabilities: vec![Capability::ManageOptions],
        }],
        ..AuthConfig::default()
    };

    sitesnap_core::http::router(AdminApp::new(collector, clock, tokens), auth)
}

/// Value of the first `marker"...` attribute after `marker`.
fn attribute_after(html: &str, marker: &str) -> String {
    let start = html.find(marker).expect("marker present") + marker.len();
    let rest = &html[start..];
    let end = rest.find('"').expect("closing quote");
    rest[..end].to_string()
}

async fn dashboard(router: &Router) -> String {
    let request = Request::builder()
        .uri("/admin")
        .header(header::AUTHORIZATION, "Bearer admin-key")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn export_request(uri: &str, form: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, "Bearer admin-key")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap()
}

fn parse_csv(body: &[u8]) -> Vec<Vec<String>> {
    assert_eq!(&body[..3], b"\xEF\xBB\xBF");
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(&body[3..])
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

#[tokio::test]
async fn test_direct_export_from_dashboard_token() {
    let site = site();
    let router = router(site.path());

    let html = dashboard(&router).await;
    let token = attribute_after(&html, "name=\"export_token\" value=\"");

    let response = router
        .clone()
        .oneshot(export_request(
            "/admin-post",
            format!("action=sitesnap_export_csv&export_token={}", token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"plugins_themes_list_2024-08-01_09-30-00.csv\""
    );
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let rows = parse_csv(&body);
    assert_eq!(
        rows,
        vec![
            vec!["Type", "Name", "Version", "Status", "Author", "Description"],
            vec!["Plugin", "Acme, \"Pro\" Edition", "2.0", "active", "Acme", ""],
            vec!["Plugin", "zeta tools", "0.1", "inactive", "", ""],
            vec!["Theme", "Astra", "4.6.1", "active", "Brainstorm Force", ""],
        ]
    );

    // The same token cannot be replayed.
    let replay = router
        .oneshot(export_request(
            "/admin-post",
            format!("action=sitesnap_export_csv&export_token={}", token),
        ))
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_ajax_export_matches_direct_export() {
    let site = site();
    let router = router(site.path());

    let html = dashboard(&router).await;
    let direct_token = attribute_after(&html, "name=\"export_token\" value=\"");
    let ajax_token = attribute_after(&html, "data-ajax-token=\"");
    assert_ne!(direct_token, ajax_token);

    let direct = router
        .clone()
        .oneshot(export_request(
            "/admin-post",
            format!("action=sitesnap_export_csv&export_token={}", direct_token),
        ))
        .await
        .unwrap();
    let direct_body = to_bytes(direct.into_body(), usize::MAX).await.unwrap();

    let ajax = router
        .clone()
        .oneshot(export_request(
            "/admin-ajax",
            format!("action=sitesnap_export_ajax&nonce={}", ajax_token),
        ))
        .await
        .unwrap();
    assert_eq!(ajax.status(), StatusCode::OK);
    let ajax_body = to_bytes(ajax.into_body(), usize::MAX).await.unwrap();

    assert_eq!(direct_body, ajax_body);
}

#[tokio::test]
async fn test_tokens_are_scoped_to_their_flow() {
    let site = site();
    let router = router(site.path());

    let html = dashboard(&router).await;
    let direct_token = attribute_after(&html, "name=\"export_token\" value=\"");

    let response = router
        .clone()
        .oneshot(export_request(
            "/admin-ajax",
            format!("action=sitesnap_export_ajax&nonce={}", direct_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tab_link_switches_listing() {
    let site = site();
    let router = router(site.path());

    let html = dashboard(&router).await;
    let link = attribute_after(&html, "<a href=\"?tab=themes&amp;tab_token=");

    let request = Request::builder()
        .uri(format!("/admin?tab=themes&tab_token={}", link))
        .header(header::AUTHORIZATION, "Bearer admin-key")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let themes_html = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(themes_html.contains("<strong>Astra</strong>"));
    assert!(!themes_html.contains("<strong>zeta tools</strong>"));
}
