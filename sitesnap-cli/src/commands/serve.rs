use anyhow::Result;
use colored::Colorize;
use sitesnap_core::{http, SiteSnapConfig};

pub async fn cmd_serve(
    mut config: SiteSnapConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    if config.auth.users.is_empty() {
        eprintln!(
            "{} No users configured under [auth]; every request will be denied.",
            "!".yellow().bold()
        );
    }

    println!(
        "{} Serving the admin dashboard on http://{}/admin",
        "→".blue(),
        config.bind_address()
    );

    http::serve(&config).await?;
    Ok(())
}
