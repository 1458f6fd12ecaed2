use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::{AuthorizationPolicy, Principal, TokenAction, TokenService};
use crate::config::SiteSnapConfig;
use crate::discovery::{DirectoryInventorySource, InventorySource};
use crate::error::{SnapError, SnapResult};
use crate::export::{DynClock, ExportDocument, InventoryExporter, SystemClock};
use crate::inventory::InventoryCollector;

use super::dashboard::{DashboardPage, PageTokens, Tab};
use super::messages;

const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminAction {
    Dashboard,
    ExportDirect,
    ExportAjax,
}

impl AdminAction {
    pub const ALL: [AdminAction; 3] = [
        AdminAction::Dashboard,
        AdminAction::ExportDirect,
        AdminAction::ExportAjax,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AdminAction::Dashboard => "sitesnap_dashboard",
            AdminAction::ExportDirect => "sitesnap_export_csv",
            AdminAction::ExportAjax => "sitesnap_export_ajax",
        }
    }

    /// Token scope guarding this action, if any.
    pub fn token_action(&self) -> Option<TokenAction> {
        match self {
            AdminAction::Dashboard => None,
            AdminAction::ExportDirect => Some(TokenAction::ExportCsv),
            AdminAction::ExportAjax => Some(TokenAction::ExportAjax),
        }
    }

    /// Request parameter carrying the token.
    pub fn token_param(&self) -> Option<&'static str> {
        match self {
            AdminAction::Dashboard => None,
            AdminAction::ExportDirect => Some("export_token"),
            AdminAction::ExportAjax => Some("nonce"),
        }
    }
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct AdminRequest {
    pub principal: Principal,
    pub params: HashMap<String, String>,
}

impl AdminRequest {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[derive(Debug)]
pub enum AdminResponse {
    Page(String),
    Download(ExportDocument),
    /// Direct flow denial, rendered as an HTML message.
    Denied { message: String },
    /// Programmatic flow error, rendered as `{"success": false, "data": message}`.
    JsonError { status: u16, message: String },
    NotFound,
    Failed { message: String },
}

impl AdminResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            AdminResponse::Page(_) | AdminResponse::Download(_) => 200,
            AdminResponse::Denied { .. } => 403,
            AdminResponse::JsonError { status, .. } => *status,
            AdminResponse::NotFound => 404,
            AdminResponse::Failed { .. } => 500,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code() == 200
    }

    fn denied(message: &str) -> Self {
        AdminResponse::Denied {
            message: message.to_string(),
        }
    }

    fn json_error(status: u16, message: &str) -> Self {
        AdminResponse::JsonError {
            status,
            message: message.to_string(),
        }
    }
}

/// Wires the inventory, export pipeline, policy and tokens behind the admin
/// action table.
pub struct AdminApp {
    collector: InventoryCollector,
    exporter: InventoryExporter,
    policy: AuthorizationPolicy,
    tokens: Arc<TokenService>,
    actions: HashMap<&'static str, AdminAction>,
}

impl AdminApp {
    pub fn new(collector: InventoryCollector, clock: DynClock, tokens: Arc<TokenService>) -> Self {
        let exporter = InventoryExporter::new(collector.clone(), clock);
        let actions = AdminAction::ALL
            .into_iter()
            .map(|action| (action.name(), action))
            .collect();

        Self {
            collector,
            exporter,
            policy: AuthorizationPolicy::default(),
            tokens,
            actions,
        }
    }

    /// Builds the app over the on-disk site described by `config`.
    pub fn from_config(config: &SiteSnapConfig) -> Self {
        let clock: DynClock = Arc::new(SystemClock);
        let source: Arc<dyn InventorySource> =
            Arc::new(DirectoryInventorySource::from_config(&config.site));
        let tokens = Arc::new(token_service_from_config(config, clock.clone()));

        Self::new(InventoryCollector::new(source), clock, tokens)
    }

    pub fn with_policy(mut self, policy: AuthorizationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    pub fn collector(&self) -> &InventoryCollector {
        &self.collector
    }

    pub fn resolve(&self, action_name: &str) -> Option<AdminAction> {
        self.actions.get(action_name).copied()
    }

    pub async fn dispatch(&self, action_name: &str, request: AdminRequest) -> AdminResponse {
        let Some(action) = self.resolve(action_name) else {
            debug!(action = %action_name, "Unknown admin action");
            return AdminResponse::NotFound;
        };

        info!(
            action = %action,
            principal = %request.principal.name,
            "Dispatching admin action"
        );

        match action {
            AdminAction::Dashboard => self.dashboard(&request).await,
            AdminAction::ExportDirect => self.export_direct(&request).await,
            AdminAction::ExportAjax => self.export_ajax(&request).await,
        }
    }

    /// Policy then token. Nothing is collected unless both pass.
    fn guard(&self, action: AdminAction, request: &AdminRequest) -> SnapResult<()> {
        self.policy.authorize(&request.principal)?;

        if let (Some(scope), Some(param)) = (action.token_action(), action.token_param()) {
            self.tokens
                .verify(request.param(param), scope, &request.principal)?;
        }

        Ok(())
    }

    async fn dashboard(&self, request: &AdminRequest) -> AdminResponse {
        if let Err(e) = self.guard(AdminAction::Dashboard, request) {
            e.log();
            return AdminResponse::denied(messages::PERMISSION_DENIED);
        }

        let tab = self.selected_tab(request);

        let plugins = match self.collector.collect_plugins().await {
            Ok(p) => p,
            Err(e) => return failed(e),
        };
        let themes = match self.collector.collect_themes().await {
            Ok(t) => t,
            Err(e) => return failed(e),
        };

        let principal = &request.principal;
        let tokens = PageTokens {
            export: self.tokens.issue(TokenAction::ExportCsv, principal),
            ajax: self.tokens.issue(TokenAction::ExportAjax, principal),
            plugins_tab: self.tokens.issue(TokenAction::SelectTab, principal),
            themes_tab: self.tokens.issue(TokenAction::SelectTab, principal),
        };

        let html = DashboardPage {
            tab,
            plugins: &plugins,
            themes: &themes,
            tokens: &tokens,
        }
        .render();

        AdminResponse::Page(html)
    }

    fn selected_tab(&self, request: &AdminRequest) -> Tab {
        let Some(requested) = request.param("tab") else {
            return Tab::default();
        };

        let Ok(tab) = requested.parse::<Tab>() else {
            debug!(tab = %requested, "Ignoring unknown tab");
            return Tab::default();
        };

        match self.tokens.check(
            request.param("tab_token"),
            TokenAction::SelectTab,
            &request.principal,
        ) {
            Ok(()) => tab,
            Err(e) => {
                debug!(tab = %tab, error = %e, "Tab selection not verified, using default");
                Tab::default()
            }
        }
    }

    async fn export_direct(&self, request: &AdminRequest) -> AdminResponse {
        if let Err(e) = self.guard(AdminAction::ExportDirect, request) {
            e.log();
            return AdminResponse::denied(denial_message(&e));
        }

        match self.exporter.export().await {
            Ok(document) => AdminResponse::Download(document),
            Err(e) => failed(e),
        }
    }

    async fn export_ajax(&self, request: &AdminRequest) -> AdminResponse {
        if let Err(e) = self.guard(AdminAction::ExportAjax, request) {
            e.log();
            return AdminResponse::json_error(403, denial_message(&e));
        }

        match self.exporter.export().await {
            Ok(document) => AdminResponse::Download(document),
            Err(e) => {
                e.log();
                AdminResponse::json_error(500, messages::GENERIC_ERROR)
            }
        }
    }
}

/// Token service keyed from config, or with a random key when none is set.
pub fn token_service_from_config(config: &SiteSnapConfig, clock: DynClock) -> TokenService {
    let secs = i64::try_from(config.auth.token_ttl_secs)
        .unwrap_or(MAX_TOKEN_TTL_SECS)
        .min(MAX_TOKEN_TTL_SECS);
    let ttl = Duration::seconds(secs);
    match config.auth.token_secret() {
        Some(secret) => TokenService::new(secret.as_bytes().to_vec(), ttl, clock),
        None => {
            debug!("No token secret configured, using a per-process key");
            TokenService::ephemeral(ttl, clock)
        }
    }
}

fn denial_message(error: &SnapError) -> &'static str {
    match error {
        SnapError::InvalidToken { .. } => messages::SECURITY_CHECK_FAILED,
        _ => messages::PERMISSION_DENIED,
    }
}

fn failed(error: SnapError) -> AdminResponse {
    error.log();
    AdminResponse::Failed {
        message: messages::GENERIC_ERROR.to_string(),
    }
}
