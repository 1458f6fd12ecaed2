use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{SnapError, SnapResult};
use crate::inventory::InventoryCollector;
use crate::models::{ExtensionKind, ExtensionRecord};

use super::clock::DynClock;
use super::serializer;

pub const HEADER_ROW: [&str; 6] = ["Type", "Name", "Version", "Status", "Author", "Description"];

pub const CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const FILENAME_PREFIX: &str = "plugins_themes_list_";
const FILENAME_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// `plugins_themes_list_<YYYY-MM-DD_HH-MM-SS>.csv` for the given UTC instant.
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("{}{}.csv", FILENAME_PREFIX, at.format(FILENAME_TIME_FORMAT))
}

/// Header row followed by plugin rows, then theme rows.
pub fn build_rows(plugins: &[ExtensionRecord], themes: &[ExtensionRecord]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(1 + plugins.len() + themes.len());
    rows.push(HEADER_ROW.iter().map(|h| h.to_string()).collect());

    let tagged = plugins
        .iter()
        .map(|r| (ExtensionKind::Plugin, r))
        .chain(themes.iter().map(|r| (ExtensionKind::Theme, r)));

    for (kind, record) in tagged {
        let mut row = Vec::with_capacity(HEADER_ROW.len());
        row.push(kind.label().to_string());
        row.extend(record.export_fields().iter().map(|f| f.to_string()));
        rows.push(row);
    }

    rows
}

/// A rendered export, ready to be delivered.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub filename: String,
    pub generated_at: DateTime<Utc>,
    pub plugin_count: usize,
    pub theme_count: usize,
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl ExportDocument {
    pub fn assemble(
        plugins: &[ExtensionRecord],
        themes: &[ExtensionRecord],
        generated_at: DateTime<Utc>,
    ) -> Self {
        let rows = build_rows(plugins, themes);
        Self {
            filename: export_filename(generated_at),
            generated_at,
            plugin_count: plugins.len(),
            theme_count: themes.len(),
            body: serializer::render(&rows),
        }
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }

    /// Response headers for delivering the document as a download.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", CONTENT_TYPE.to_string()),
            ("Content-Disposition", self.content_disposition()),
            ("Pragma", "no-cache".to_string()),
            ("Expires", "0".to_string()),
        ]
    }

    pub fn row_count(&self) -> usize {
        1 + self.plugin_count + self.theme_count
    }

    /// Writes the document into `dir` under its own filename, creating the
    /// directory if needed.
    pub async fn write_to_dir(&self, dir: &Path) -> SnapResult<PathBuf> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            SnapError::ExportFailed(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let path = dir.join(&self.filename);
        tokio::fs::write(&path, &self.body)
            .await
            .map_err(|e| SnapError::ExportFailed(format!("cannot write {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), bytes = self.body.len(), "Wrote export document");
        Ok(path)
    }
}

/// Collects both inventories and renders the export document.
#[derive(Clone)]
pub struct InventoryExporter {
    collector: InventoryCollector,
    clock: DynClock,
}

impl InventoryExporter {
    pub fn new(collector: InventoryCollector, clock: DynClock) -> Self {
        Self { collector, clock }
    }

    pub async fn export(&self) -> SnapResult<ExportDocument> {
        let generated_at = self.clock.now();

        let plugins = self.collector.collect_plugins().await?;
        let themes = self.collector.collect_themes().await?;

        let document = ExportDocument::assemble(&plugins, &themes, generated_at);

        info!(
            filename = %document.filename,
            plugins = document.plugin_count,
            themes = document.theme_count,
            bytes = document.body.len(),
            "Rendered inventory export"
        );

        Ok(document)
    }
}
