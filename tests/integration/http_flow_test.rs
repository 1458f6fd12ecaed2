use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use sitesnap_core::config::{AuthConfig, UserConfig};
use sitesnap_core::discovery::{InventorySource, PluginInventory, StaticInventorySource, ThemeInventory};
use sitesnap_core::{
    AdminApp, Capability, DynClock, ExtensionMetadata, FixedClock, InventoryCollector,
    SnapResult, TokenService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Wraps a static source and counts how often the inventory is read.
struct CountingSource {
    inner: StaticInventorySource,
    reads: Arc<AtomicUsize>,
}

#[async_trait]
impl InventorySource for CountingSource {
    fn name(&self) -> &str {
        "counting"
    }

    async fn plugins(&self) -> SnapResult<PluginInventory> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.plugins().await
    }

    async fn themes(&self) -> SnapResult<ThemeInventory> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.themes().await
    }
}

struct Harness {
    router: Router,
    reads: Arc<AtomicUsize>,
}

fn auth() -> AuthConfig {
    AuthConfig {
        users: vec![
            UserConfig {
                name: "admin".to_string(),
                api_key: "admin-key".to_string(),
                capabilities: vec![Capability::ManageOptions],
            },
            UserConfig {
                name: "editor".to_string(),
                api_key: "editor-key".to_string(),
                capabilities: vec![Capability::Read],
            },
        ],
        ..AuthConfig::default()
    }
}

fn harness() -> Harness {
    let reads = Arc::new(AtomicUsize::new(0));
    let source = CountingSource {
        inner: StaticInventorySource::new()
            .with_plugin(
                "hello.php",
                ExtensionMetadata::new()
                    .with_name("Hello <Dolly>")
                    .with_version("1.7"),
            )
            .with_theme("astra", ExtensionMetadata::new().with_name("Astra"))
            .with_current_theme("astra"),
        reads: reads.clone(),
    };

    let at = Utc.with_ymd_and_hms(2024, 8, 1, 9, 30, 0).unwrap();
    let clock: DynClock = Arc::new(FixedClock(at));
    let tokens = Arc::new(TokenService::new(
        b"integration-secret".to_vec(),
        Duration::hours(24),
        clock.clone(),
    ));
    let app = AdminApp::new(InventoryCollector::new(Arc::new(source)), clock, tokens);

    Harness {
        router: sitesnap_core::http::router(app, auth()),
        reads,
    }
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn get(uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, key: Option<&str>, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let response = h.router.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert_eq!(body, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn test_dashboard_requires_admin() {
    let h = harness();

    let anonymous = h.router.clone().oneshot(get("/admin", None)).await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::FORBIDDEN);
    assert!(body_string(anonymous)
        .await
        .contains("You do not have sufficient permissions to access this page."));

    let editor = h
        .router
        .clone()
        .oneshot(get("/admin", Some("editor-key")))
        .await
        .unwrap();
    assert_eq!(editor.status(), StatusCode::FORBIDDEN);

    assert_eq!(h.reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dashboard_renders_escaped_listing() {
    let h = harness();
    let response = h
        .router
        .oneshot(get("/admin", Some("admin-key")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Hello &lt;Dolly&gt;"));
    assert!(!html.contains("Hello <Dolly>"));
    assert!(html.contains("Plugins <span class=\"sitesnap-count\">(1)</span>"));
    assert!(html.contains("Themes <span class=\"sitesnap-count\">(1)</span>"));
    assert!(html.contains("data-ajax-token=\""));
}

#[tokio::test]
async fn test_unverified_tab_falls_back_to_plugins() {
    let h = harness();
    let response = h
        .router
        .oneshot(get("/admin?tab=themes&tab_token=forged", Some("admin-key")))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("<strong>Hello &lt;Dolly&gt;</strong>"));
    assert!(!html.contains("<strong>Astra</strong>"));
}

#[tokio::test]
async fn test_export_without_token_never_reads_inventory() {
    let h = harness();

    let direct = h
        .router
        .clone()
        .oneshot(post_form(
            "/admin-post",
            Some("admin-key"),
            "action=sitesnap_export_csv",
        ))
        .await
        .unwrap();
    assert_eq!(direct.status(), StatusCode::FORBIDDEN);
    assert!(body_string(direct).await.contains("Security check failed."));

    let ajax = h
        .router
        .clone()
        .oneshot(post_form(
            "/admin-ajax",
            Some("admin-key"),
            "action=sitesnap_export_ajax&nonce=garbage",
        ))
        .await
        .unwrap();
    assert_eq!(ajax.status(), StatusCode::FORBIDDEN);
    let json: serde_json::Value = serde_json::from_str(&body_string(ajax).await).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["data"], "Security check failed.");

    assert_eq!(h.reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ajax_permission_denied_payload() {
    let h = harness();
    let response = h
        .router
        .clone()
        .oneshot(post_form(
            "/admin-ajax",
            None,
            "action=sitesnap_export_ajax&nonce=whatever",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "success": false,
            "data": "You do not have sufficient permissions to access this page."
        })
    );
    assert_eq!(h.reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_actions() {
    let h = harness();

    let post = h
        .router
        .clone()
        .oneshot(post_form("/admin-post", Some("admin-key"), "action=sitesnap_dashboard"))
        .await
        .unwrap();
    assert_eq!(post.status(), StatusCode::NOT_FOUND);

    let ajax = h
        .router
        .clone()
        .oneshot(post_form("/admin-ajax", Some("admin-key"), "action=nope"))
        .await
        .unwrap();
    assert_eq!(ajax.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_string(ajax).await).unwrap();
    assert_eq!(json["success"], false);
}
