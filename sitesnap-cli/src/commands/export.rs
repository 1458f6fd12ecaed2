use anyhow::Result;
use colored::Colorize;
use sitesnap_core::{
    DirectoryInventorySource, InventoryCollector, InventoryExporter, SiteSnapConfig, SystemClock,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Local operator export. Runs the same collect and render pipeline as the
/// admin endpoints, without the request checks.
pub async fn cmd_export(
    config: &SiteSnapConfig,
    output: Option<PathBuf>,
    to_stdout: bool,
) -> Result<()> {
    let exporter = InventoryExporter::new(
        InventoryCollector::new(Arc::new(DirectoryInventorySource::from_config(&config.site))),
        Arc::new(SystemClock),
    );

    let document = exporter.export().await?;

    if to_stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&document.body)?;
        stdout.flush()?;
        return Ok(());
    }

    let dir = output.unwrap_or_else(|| config.export.output_dir.clone());
    let path = document.write_to_dir(&dir).await?;

    println!(
        "{} Exported {} plugins and {} themes",
        "✓".green().bold(),
        document.plugin_count,
        document.theme_count
    );
    println!("  {} {}", "→".blue(), path.display());

    Ok(())
}
