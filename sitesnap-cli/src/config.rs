use anyhow::{bail, Context, Result};
use sitesnap_core::SiteSnapConfig;
use std::path::{Path, PathBuf};

/// Loads the layered configuration, or only `explicit` when given, then applies
/// command-line overrides.
pub fn load_config(explicit: Option<&Path>, root: Option<PathBuf>) -> Result<SiteSnapConfig> {
    let mut config = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            SiteSnapConfig::load_from_paths(vec![path.to_path_buf()])
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => SiteSnapConfig::load().context("Failed to load configuration")?,
    };

    if let Some(root) = root {
        config.site.root = root;
    }

    Ok(config)
}
