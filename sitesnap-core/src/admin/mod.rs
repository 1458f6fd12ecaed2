//! The admin shell: capability and token checks in front of the dashboard and
//! both export entry points.

mod actions;
mod dashboard;
pub mod messages;

pub use actions::{token_service_from_config, AdminAction, AdminApp, AdminRequest, AdminResponse};
pub use dashboard::{escape_html, DashboardPage, PageTokens, Tab};
