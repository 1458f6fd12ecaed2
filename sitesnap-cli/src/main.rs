use clap::{Parser, Subcommand};
use colored::Colorize;
use sitesnap_core::{CliErrorDisplay, LoggingConfig, SiteSnapConfig, SnapError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

use commands::{cmd_export, cmd_list, cmd_serve, cmd_token, ListOptions};
use config::load_config;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "sitesnap")]
#[command(version = VERSION)]
#[command(about = "Sitesnap - inventory and CSV export of a site's plugins and themes")]
#[command(long_about = r#"
Sitesnap reads the plugins and themes installed in a site, reports which ones
are active, and exports the combined list as a spreadsheet-ready CSV file.

Use 'sitesnap list' to browse the inventory, 'sitesnap export' to write the
CSV, and 'sitesnap serve' to run the admin dashboard over HTTP.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, help = "Load configuration from this file only")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Site installation root")]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List installed plugins and themes")]
    List {
        #[arg(short, long, default_value = "all", help = "plugins, themes or all")]
        kind: String,

        #[arg(long, help = "Only show active or inactive entries")]
        status: Option<String>,

        #[arg(short, long, help = "Case-insensitive search across all columns")]
        search: Option<String>,

        #[arg(
            long,
            default_value = "name",
            help = "Sort column (name, version, status, author)"
        )]
        sort: String,

        #[arg(long, help = "Sort descending")]
        desc: bool,

        #[arg(
            short,
            long,
            default_value = "text",
            help = "Output format (text, json)"
        )]
        format: String,
    },

    #[command(about = "Export the inventory to plugins_themes_list_<timestamp>.csv")]
    Export {
        #[arg(short, long, help = "Directory to write the file into")]
        output: Option<PathBuf>,

        #[arg(long, help = "Write the CSV to stdout instead of a file")]
        stdout: bool,
    },

    #[command(about = "Run the admin dashboard and export endpoints")]
    #[command(long_about = r#"
Run the admin dashboard and export endpoints.

Every request must carry 'Authorization: Bearer <api_key>' for a user listed under
[[auth.users]]. Requests without it are anonymous and denied, including the form
and tab links on the dashboard, so use a client that sends the header.
"#)]
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    #[command(about = "Issue an anti-forgery token for a configured user")]
    Token {
        #[arg(short, long)]
        user: String,

        #[arg(
            short,
            long,
            default_value = "export_ajax",
            help = "export_csv, export_ajax or select_tab"
        )]
        action: String,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Version { detailed } = cli.command {
        cmd_version(detailed);
        return ExitCode::SUCCESS;
    }

    let config = match load_config(cli.config.as_deref(), cli.root.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let long_running = matches!(cli.command, Commands::Serve { .. });
    init_logging(cli.verbose, long_running, &config.logging);

    match run(cli.command, config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<SnapError>() {
                Some(snap) => {
                    eprint!("{}: {}", "Error".red().bold(), CliErrorDisplay::new(snap))
                }
                None => eprintln!("{}: {:#}", "Error".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

/// `-v` wins, then `RUST_LOG`. The server logs at the configured level while
/// one-shot commands stay quiet below warnings.
fn init_logging(verbose: bool, long_running: bool, logging: &LoggingConfig) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if long_running {
                EnvFilter::new(&logging.level)
            } else {
                EnvFilter::new("warn")
            }
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(command: Commands, config: SiteSnapConfig) -> anyhow::Result<()> {
    match command {
        Commands::List {
            kind,
            status,
            search,
            sort,
            desc,
            format,
        } => {
            cmd_list(
                &config,
                ListOptions {
                    kind,
                    status,
                    search,
                    sort,
                    desc,
                    format,
                },
            )
            .await
        }
        Commands::Export { output, stdout } => cmd_export(&config, output, stdout).await,
        Commands::Serve { host, port } => cmd_serve(config, host, port).await,
        Commands::Token { user, action } => cmd_token(&config, &user, &action),
        Commands::Version { detailed } => {
            cmd_version(detailed);
            Ok(())
        }
    }
}

fn cmd_version(detailed: bool) {
    if detailed {
        println!("{}", "Sitesnap Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} GPL-2.0-or-later", "License:".bold());
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("sitesnap {}", VERSION);
    }
}
