use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::error::SnapResult;
use crate::models::{ExtensionMetadata, InstalledExtension};

use super::{InventorySource, PluginInventory, ThemeInventory};

/// In-memory inventory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticInventorySource {
    plugins: Vec<InstalledExtension>,
    active_plugins: BTreeSet<String>,
    themes: Vec<InstalledExtension>,
    current_theme: Option<String>,
}

impl StaticInventorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin(mut self, id: impl Into<String>, metadata: ExtensionMetadata) -> Self {
        self.plugins.push(InstalledExtension::new(id, metadata));
        self
    }

    pub fn with_active_plugin(mut self, id: impl Into<String>) -> Self {
        self.active_plugins.insert(id.into());
        self
    }

    pub fn with_theme(mut self, id: impl Into<String>, metadata: ExtensionMetadata) -> Self {
        self.themes.push(InstalledExtension::new(id, metadata));
        self
    }

    pub fn with_current_theme(mut self, id: impl Into<String>) -> Self {
        self.current_theme = Some(id.into());
        self
    }
}

#[async_trait]
impl InventorySource for StaticInventorySource {
    fn name(&self) -> &str {
        "static"
    }

    async fn plugins(&self) -> SnapResult<PluginInventory> {
        Ok(PluginInventory {
            installed: self.plugins.clone(),
            active: self.active_plugins.clone(),
        })
    }

    async fn themes(&self) -> SnapResult<ThemeInventory> {
        Ok(ThemeInventory {
            installed: self.themes.clone(),
            current: self.current_theme.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_snapshot() {
        let source = StaticInventorySource::new()
            .with_plugin("a/a.php", ExtensionMetadata::new().with_name("A"))
            .with_plugin("b.php", ExtensionMetadata::new().with_name("B"))
            .with_active_plugin("b.php")
            .with_theme("classic", ExtensionMetadata::new().with_name("Classic"))
            .with_current_theme("classic");

        let plugins = source.plugins().await.unwrap();
        assert_eq!(plugins.installed.len(), 2);
        assert!(plugins.is_active("b.php"));

        let themes = source.themes().await.unwrap();
        assert_eq!(themes.installed.len(), 1);
        assert!(themes.is_active("classic"));
    }

    #[tokio::test]
    async fn test_empty_static_source() {
        let source = StaticInventorySource::new();
        assert!(source.plugins().await.unwrap().installed.is_empty());
        assert!(source.themes().await.unwrap().current.is_none());
    }
}
