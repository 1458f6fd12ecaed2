use std::sync::Arc;
use tracing::debug;

use crate::discovery::InventorySource;
use crate::error::SnapResult;
use crate::models::{ExtensionKind, ExtensionRecord, ExtensionStatus, InstalledExtension};

use super::filter::DynInventoryFilter;

/// Turns a source's raw inventory into sorted, uniform records.
///
/// Every call reads a fresh snapshot from the source; nothing is cached between
/// calls.
#[derive(Clone)]
pub struct InventoryCollector {
    source: Arc<dyn InventorySource>,
    filters: Vec<DynInventoryFilter>,
}

impl InventoryCollector {
    pub fn new(source: Arc<dyn InventorySource>) -> Self {
        Self {
            source,
            filters: Vec::new(),
        }
    }

    /// Register a post-processing filter. Filters run in registration order,
    /// after sorting.
    pub fn with_filter(mut self, filter: DynInventoryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn source(&self) -> &Arc<dyn InventorySource> {
        &self.source
    }

    pub async fn collect_plugins(&self) -> SnapResult<Vec<ExtensionRecord>> {
        let inventory = self.source.plugins().await?;

        let records = normalize(inventory.installed, |id| inventory.active.contains(id));
        debug!(
            source = self.source.name(),
            count = records.len(),
            "Collected plugins"
        );

        Ok(self.apply_filters(ExtensionKind::Plugin, records))
    }

    pub async fn collect_themes(&self) -> SnapResult<Vec<ExtensionRecord>> {
        let inventory = self.source.themes().await?;
        let current = inventory.current.as_deref();

        let records = normalize(inventory.installed, |id| current == Some(id));
        debug!(
            source = self.source.name(),
            count = records.len(),
            "Collected themes"
        );

        Ok(self.apply_filters(ExtensionKind::Theme, records))
    }

    fn apply_filters(
        &self,
        kind: ExtensionKind,
        records: Vec<ExtensionRecord>,
    ) -> Vec<ExtensionRecord> {
        self.filters
            .iter()
            .fold(records, |records, filter| filter.filter(kind, records))
    }
}

/// Build records against one active-set predicate and sort them by name.
pub fn normalize<F>(installed: Vec<InstalledExtension>, is_active: F) -> Vec<ExtensionRecord>
where
    F: Fn(&str) -> bool,
{
    let mut records: Vec<ExtensionRecord> = installed
        .into_iter()
        .map(|ext| {
            let status = ExtensionStatus::from_active(is_active(&ext.id));
            ExtensionRecord::from_installed(ext, status)
        })
        .collect();

    sort_by_name(&mut records);
    records
}

/// Case-insensitive ascending sort by name; equal names keep their order.
pub fn sort_by_name(records: &mut [ExtensionRecord]) {
    records.sort_by_cached_key(|r| r.name.to_lowercase());
}
