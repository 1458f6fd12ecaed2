//! HTTP surface for the admin shell.
//!
//! Callers authenticate with `Authorization: Bearer <api_key>` on every request,
//! including the export form and tab links rendered by the dashboard. A plain
//! browser session does not send that header and is treated as anonymous, so the
//! dashboard is meant for clients that attach it (a proxy, a script, an HTTP
//! client with a default header).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Form, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};

use crate::admin::{escape_html, messages, AdminAction, AdminApp, AdminRequest, AdminResponse};
use crate::auth::Principal;
use crate::config::{AuthConfig, SiteSnapConfig};
use crate::error::{SnapError, SnapResult};

type AppState = Arc<AppStateInner>;

struct AppStateInner {
    app: AdminApp,
    auth: AuthConfig,
}

/// Resolves `Authorization: Bearer <key>` against the configured users.
fn principal_from_headers(auth: &AuthConfig, headers: &HeaderMap) -> Principal {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|key| auth.principal_for_key(key.trim()))
        .unwrap_or_else(Principal::anonymous)
}

fn admin_request(state: &AppState, headers: &HeaderMap, params: HashMap<String, String>) -> AdminRequest {
    AdminRequest {
        principal: principal_from_headers(&state.auth, headers),
        params,
    }
}

fn message_page(title: &str, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n\
         <body><div class=\"wrap\"><p>{}</p></div></body>\n</html>\n",
        escape_html(title),
        escape_html(message)
    )
}

impl IntoResponse for AdminResponse {
    fn into_response(self) -> Response {
        match self {
            AdminResponse::Page(html) => Html(html).into_response(),
            AdminResponse::Download(document) => (
                StatusCode::OK,
                AppendHeaders(document.headers()),
                Body::from(document.body),
            )
                .into_response(),
            AdminResponse::Denied { message } => (
                StatusCode::FORBIDDEN,
                Html(message_page(messages::PAGE_TITLE, &message)),
            )
                .into_response(),
            AdminResponse::JsonError { status, message } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                Json(json!({ "success": false, "data": message })),
            )
                .into_response(),
            AdminResponse::NotFound => (
                StatusCode::NOT_FOUND,
                Html(message_page(messages::PAGE_TITLE, messages::NOT_FOUND)),
            )
                .into_response(),
            AdminResponse::Failed { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(message_page(messages::PAGE_TITLE, &message)),
            )
                .into_response(),
        }
    }
}

async fn admin_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let request = admin_request(&state, &headers, params);
    state
        .app
        .dispatch(AdminAction::Dashboard.name(), request)
        .await
}

/// Form posts carry the action name next to the token, like the site's
/// admin-post endpoint. Only the action served by `expected` is routed here.
async fn dispatch_form(
    state: &AppState,
    headers: &HeaderMap,
    params: HashMap<String, String>,
    expected: AdminAction,
) -> AdminResponse {
    let action = params.get("action").cloned().unwrap_or_default();
    if state.app.resolve(&action) != Some(expected) {
        return AdminResponse::NotFound;
    }
    let request = admin_request(state, headers, params);
    state.app.dispatch(&action, request).await
}

async fn admin_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    dispatch_form(&state, &headers, params, AdminAction::ExportDirect).await
}

async fn admin_ajax(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    match dispatch_form(&state, &headers, params, AdminAction::ExportAjax).await {
        AdminResponse::NotFound => AdminResponse::JsonError {
            status: 400,
            message: messages::NOT_FOUND.to_string(),
        },
        other => other,
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub fn router(app: AdminApp, auth: AuthConfig) -> Router {
    let state: AppState = Arc::new(AppStateInner { app, auth });

    Router::new()
        .route("/admin", get(admin_page))
        .route("/admin-post", post(admin_post))
        .route("/admin-ajax", post(admin_ajax))
        .route("/health", get(health))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

pub async fn serve(config: &SiteSnapConfig) -> SnapResult<()> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| SnapError::InvalidConfigValue {
            key: "server.host".to_string(),
            message: format!("{}", e),
        })?;

    let app = router(AdminApp::from_config(config), config.auth.clone());

    info!(
        address = %addr,
        site_root = %config.site.root.display(),
        users = config.auth.users.len(),
        "Sitesnap admin server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
