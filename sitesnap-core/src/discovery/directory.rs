use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::config::SiteConfig;
use crate::error::{SnapError, SnapResult};
use crate::models::InstalledExtension;

use super::headers::{
    parse_file_headers, HeaderSpec, HEADER_READ_LIMIT, PLUGIN_HEADERS, THEME_HEADERS,
};
use super::{InventorySource, PluginInventory, ThemeInventory};

/// Which extensions are switched on, as recorded next to the site.
///
/// ```toml
/// active_plugins = ["akismet/akismet.php", "hello.php"]
/// stylesheet = "twentytwentyfour"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationState {
    #[serde(default)]
    pub active_plugins: Vec<String>,
    #[serde(default)]
    pub stylesheet: Option<String>,
}

impl ActivationState {
    pub const FILENAME: &'static str = "sitesnap-state.toml";

    /// Load the state file. A missing file means nothing is active.
    pub async fn load(path: &Path) -> SnapResult<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No activation state file, nothing is active");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SnapError::InvalidStateFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> SnapResult<Self> {
        toml::from_str(content).map_err(|e| SnapError::InvalidStateFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Inventory source backed by a site installation on disk.
pub struct DirectoryInventorySource {
    plugins_dir: PathBuf,
    themes_dir: PathBuf,
    state_file: PathBuf,
}

impl DirectoryInventorySource {
    pub fn new(site_root: impl Into<PathBuf>) -> Self {
        let root = site_root.into();
        Self {
            plugins_dir: root.join("wp-content").join("plugins"),
            themes_dir: root.join("wp-content").join("themes"),
            state_file: root.join(ActivationState::FILENAME),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            plugins_dir: config.plugins_dir(),
            themes_dir: config.themes_dir(),
            state_file: config.state_file(),
        }
    }

    pub fn with_plugins_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugins_dir = dir.into();
        self
    }

    pub fn with_themes_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.themes_dir = dir.into();
        self
    }

    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = path.into();
        self
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    pub fn themes_dir(&self) -> &Path {
        &self.themes_dir
    }

    async fn scan_plugins(&self) -> SnapResult<Vec<InstalledExtension>> {
        let mut found = Vec::new();
        let Some(mut entries) = open_dir(&self.plugins_dir).await? else {
            return Ok(found);
        };

        while let Some(entry) = next_entry(&mut entries, &self.plugins_dir).await? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') {
                continue;
            }
            let path = entry.path();

            if path.is_dir() {
                let mut nested = match tokio::fs::read_dir(&path).await {
                    Ok(nested) => nested,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable plugin directory");
                        continue;
                    }
                };
                while let Some(inner) = next_entry(&mut nested, &path).await? {
                    let inner_name = inner.file_name().to_string_lossy().into_owned();
                    if inner_name.starts_with('.') || !is_php_file(&inner_name) {
                        continue;
                    }
                    let id = format!("{}/{}", file_name, inner_name);
                    if let Some(ext) = read_extension(&inner.path(), id, &PLUGIN_HEADERS).await {
                        found.push(ext);
                    }
                }
            } else if is_php_file(&file_name) {
                if let Some(ext) = read_extension(&path, file_name, &PLUGIN_HEADERS).await {
                    found.push(ext);
                }
            }
        }

        Ok(found)
    }

    async fn scan_themes(&self) -> SnapResult<Vec<InstalledExtension>> {
        let mut found = Vec::new();
        let Some(mut entries) = open_dir(&self.themes_dir).await? else {
            return Ok(found);
        };

        while let Some(entry) = next_entry(&mut entries, &self.themes_dir).await? {
            let slug = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if slug.starts_with('.') || !path.is_dir() {
                continue;
            }
            let stylesheet = path.join("style.css");
            if !stylesheet.is_file() {
                debug!(theme = %slug, "Directory has no style.css, not a theme");
                continue;
            }
            // Themes are identified by directory, so a stylesheet without a
            // name header still counts.
            match read_header_block(&stylesheet).await {
                Ok(content) => {
                    let parsed = parse_file_headers(&content, &THEME_HEADERS);
                    found.push(InstalledExtension::new(slug, parsed.metadata));
                }
                Err(e) => {
                    warn!(path = %stylesheet.display(), error = %e, "Skipping unreadable theme stylesheet");
                }
            }
        }

        Ok(found)
    }
}

#[async_trait]
impl InventorySource for DirectoryInventorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn plugins(&self) -> SnapResult<PluginInventory> {
        let state = ActivationState::load(&self.state_file).await?;
        let installed = self.scan_plugins().await?;

        info!(
            installed = installed.len(),
            active = state.active_plugins.len(),
            dir = %self.plugins_dir.display(),
            "Scanned plugins"
        );

        Ok(PluginInventory {
            installed,
            active: state.active_plugins.into_iter().collect::<BTreeSet<_>>(),
        })
    }

    async fn themes(&self) -> SnapResult<ThemeInventory> {
        let state = ActivationState::load(&self.state_file).await?;
        let installed = self.scan_themes().await?;

        info!(
            installed = installed.len(),
            current = state.stylesheet.as_deref().unwrap_or(""),
            dir = %self.themes_dir.display(),
            "Scanned themes"
        );

        Ok(ThemeInventory {
            installed,
            current: state.stylesheet,
        })
    }
}

fn is_php_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
}

async fn open_dir(dir: &Path) -> SnapResult<Option<tokio::fs::ReadDir>> {
    match tokio::fs::read_dir(dir).await {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "Extensions directory does not exist");
            Ok(None)
        }
        Err(e) => Err(SnapError::DirectoryUnreadable {
            path: dir.display().to_string(),
            message: e.to_string(),
        }),
    }
}

async fn next_entry(
    entries: &mut tokio::fs::ReadDir,
    dir: &Path,
) -> SnapResult<Option<tokio::fs::DirEntry>> {
    entries
        .next_entry()
        .await
        .map_err(|e| SnapError::DirectoryUnreadable {
            path: dir.display().to_string(),
            message: e.to_string(),
        })
}

async fn read_header_block(path: &Path) -> std::io::Result<String> {
    let file = tokio::fs::File::open(path).await?;
    let mut buf = Vec::with_capacity(HEADER_READ_LIMIT);
    file.take(HEADER_READ_LIMIT as u64)
        .read_to_end(&mut buf)
        .await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Read a candidate plugin file; `None` when it is not a plugin or unreadable.
async fn read_extension(path: &Path, id: String, spec: &HeaderSpec) -> Option<InstalledExtension> {
    let content = match read_header_block(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping unreadable extension file");
            return None;
        }
    };

    let parsed = parse_file_headers(&content, spec);
    if !parsed.declares_name {
        return None;
    }
    Some(InstalledExtension::new(id, parsed.metadata))
}
