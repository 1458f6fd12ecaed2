use anyhow::{anyhow, Result};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;
use sitesnap_core::admin::messages;
use sitesnap_core::{
    DirectoryInventorySource, ExtensionKind, ExtensionRecord, ExtensionStatus, InventoryCollector,
    ListingQuery, SiteSnapConfig, SortDirection, SortKey, StatusFilter,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

const DESCRIPTION_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindSelection {
    Plugins,
    Themes,
    All,
}

impl KindSelection {
    fn includes(&self, kind: ExtensionKind) -> bool {
        match self {
            KindSelection::All => true,
            KindSelection::Plugins => kind == ExtensionKind::Plugin,
            KindSelection::Themes => kind == ExtensionKind::Theme,
        }
    }
}

impl FromStr for KindSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plugins" | "plugin" => Ok(KindSelection::Plugins),
            "themes" | "theme" => Ok(KindSelection::Themes),
            "all" => Ok(KindSelection::All),
            other => Err(format!(
                "Unknown kind '{}'. Valid options: plugins, themes, all",
                other
            )),
        }
    }
}

pub struct ListOptions {
    pub kind: String,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort: String,
    pub desc: bool,
    pub format: String,
}

#[derive(Serialize)]
struct ListOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    plugins: Option<Vec<ExtensionRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    themes: Option<Vec<ExtensionRecord>>,
}

pub async fn cmd_list(config: &SiteSnapConfig, options: ListOptions) -> Result<()> {
    let kind = KindSelection::from_str(&options.kind).map_err(|e| anyhow!(e))?;
    let sort = SortKey::from_str(&options.sort).map_err(|e| anyhow!(e))?;
    let direction = if options.desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };

    let mut query = ListingQuery::new().sorted_by(sort, direction);
    if let Some(term) = options.search {
        query = query.with_search(term);
    }

    debug!(
        site_root = %config.site.root.display(),
        kind = ?kind,
        query = ?query,
        "Listing inventory"
    );

    let mut collector =
        InventoryCollector::new(Arc::new(DirectoryInventorySource::from_config(&config.site)));
    if let Some(status) = options.status.as_deref() {
        let status = ExtensionStatus::from_str(status).map_err(|e| anyhow!(e))?;
        collector = collector.with_filter(Arc::new(StatusFilter::new(status)));
    }

    let plugins = if kind.includes(ExtensionKind::Plugin) {
        Some(query.apply(&collector.collect_plugins().await?))
    } else {
        None
    };
    let themes = if kind.includes(ExtensionKind::Theme) {
        Some(query.apply(&collector.collect_themes().await?))
    } else {
        None
    };

    if options.format == "json" {
        let output = ListOutput { plugins, themes };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(plugins) = plugins {
        print_section("Plugins", &plugins, messages::NO_PLUGINS);
    }
    if let Some(themes) = themes {
        print_section("Themes", &themes, messages::NO_THEMES);
    }

    Ok(())
}

fn print_section(title: &str, records: &[ExtensionRecord], empty_message: &str) {
    println!("{} ({})", title.cyan().bold(), records.len());
    println!();

    if records.is_empty() {
        println!("{}", empty_message.yellow());
        println!();
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Name").fg(Color::White),
            Cell::new("Version").fg(Color::White),
            Cell::new("Status").fg(Color::White),
            Cell::new("Author").fg(Color::White),
            Cell::new("Description").fg(Color::White),
        ]);

    for record in records {
        let status_cell = match record.status {
            ExtensionStatus::Active => Cell::new("active").fg(Color::Green),
            ExtensionStatus::Inactive => Cell::new("inactive").fg(Color::DarkGrey),
        };

        table.add_row(vec![
            Cell::new(or_dash(&record.name)),
            Cell::new(or_dash(&record.version)),
            status_cell,
            Cell::new(or_dash(&record.author)),
            Cell::new(truncate(&record.description, DESCRIPTION_WIDTH)),
        ]);
    }

    println!("{table}");
    println!();
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    let single_line = value.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let kept: String = single_line.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
