mod directory;
mod headers;
mod static_source;

pub use directory::{ActivationState, DirectoryInventorySource};
pub use headers::{
    parse_file_headers, HeaderSpec, ParsedHeaders, HEADER_READ_LIMIT, PLUGIN_HEADERS, THEME_HEADERS,
};
pub use static_source::StaticInventorySource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::SnapResult;
use crate::models::InstalledExtension;

/// Installed plugins together with the active set, read as one snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginInventory {
    pub installed: Vec<InstalledExtension>,
    pub active: BTreeSet<String>,
}

impl PluginInventory {
    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }
}

/// Installed themes together with the current theme identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeInventory {
    pub installed: Vec<InstalledExtension>,
    pub current: Option<String>,
}

impl ThemeInventory {
    pub fn is_active(&self, id: &str) -> bool {
        self.current.as_deref() == Some(id)
    }
}

/// Read-only view of what is installed on a site.
///
/// Each call must return the installed list and the active snapshot from the same
/// read; callers never combine two calls to derive status. Ordering of `installed`
/// is unspecified.
#[async_trait]
pub trait InventorySource: Send + Sync {
    fn name(&self) -> &str;

    async fn plugins(&self) -> SnapResult<PluginInventory>;

    async fn themes(&self) -> SnapResult<ThemeInventory>;
}
