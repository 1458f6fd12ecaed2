use anyhow::{anyhow, bail, Result};
use colored::Colorize;
use sitesnap_core::admin::token_service_from_config;
use sitesnap_core::auth::token_expiry;
use sitesnap_core::{SiteSnapConfig, SystemClock, TokenAction};
use std::str::FromStr;
use std::sync::Arc;

/// Issues a token for scripting the programmatic export against a running
/// server. The server must share the configured secret.
pub fn cmd_token(config: &SiteSnapConfig, user: &str, action: &str) -> Result<()> {
    let action = TokenAction::from_str(action).map_err(|e| anyhow!(e))?;

    if config.auth.token_secret().is_none() {
        bail!("auth.token_secret is not set; tokens issued here would not be accepted by the server");
    }

    let principal = config
        .auth
        .principal_named(user)
        .ok_or_else(|| anyhow!("Unknown user '{}'. Add it under [[auth.users]].", user))?;

    let tokens = token_service_from_config(config, Arc::new(SystemClock));
    let token = tokens.issue(action, &principal);

    println!("{}", token);
    if let Some(expires) = token_expiry(&token) {
        eprintln!(
            "{} {} for '{}' expires {}",
            "✓".green().bold(),
            action,
            principal.name,
            expires.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    Ok(())
}
