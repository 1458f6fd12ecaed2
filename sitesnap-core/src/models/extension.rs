use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionKind {
    Plugin,
    Theme,
}

impl ExtensionKind {
    /// Value of the `Type` column in exported documents.
    pub fn label(&self) -> &'static str {
        match self {
            ExtensionKind::Plugin => "Plugin",
            ExtensionKind::Theme => "Theme",
        }
    }
}

impl std::fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtensionKind::Plugin => write!(f, "plugin"),
            ExtensionKind::Theme => write!(f, "theme"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionStatus {
    Active,
    Inactive,
}

impl ExtensionStatus {
    pub fn from_active(active: bool) -> Self {
        if active {
            ExtensionStatus::Active
        } else {
            ExtensionStatus::Inactive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionStatus::Active => "active",
            ExtensionStatus::Inactive => "inactive",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ExtensionStatus::Active)
    }
}

impl std::fmt::Display for ExtensionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtensionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ExtensionStatus::Active),
            "inactive" => Ok(ExtensionStatus::Inactive),
            other => Err(format!(
                "Unknown status '{}'. Valid options: active, inactive",
                other
            )),
        }
    }
}

/// Header fields as read from the upstream source. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
}

impl ExtensionMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One installed extension as enumerated by an inventory source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledExtension {
    /// Source-owned identifier: plugin file path or theme slug.
    pub id: String,
    pub metadata: ExtensionMetadata,
}

impl InstalledExtension {
    pub fn new(id: impl Into<String>, metadata: ExtensionMetadata) -> Self {
        Self {
            id: id.into(),
            metadata,
        }
    }
}

/// Uniform record produced by the inventory collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    pub id: String,
    pub name: String,
    pub version: String,
    pub status: ExtensionStatus,
    pub author: String,
    pub description: String,
}

impl ExtensionRecord {
    /// Normalize an installed extension; missing fields become empty strings.
    pub fn from_installed(installed: InstalledExtension, status: ExtensionStatus) -> Self {
        let ExtensionMetadata {
            name,
            version,
            author,
            description,
        } = installed.metadata;

        Self {
            id: installed.id,
            name: name.unwrap_or_default(),
            version: version.unwrap_or_default(),
            status,
            author: author.unwrap_or_default(),
            description: description.unwrap_or_default(),
        }
    }

    /// Fields in export column order, without the `Type` column.
    pub fn export_fields(&self) -> [&str; 5] {
        [
            &self.name,
            &self.version,
            self.status.as_str(),
            &self.author,
            &self.description,
        ]
    }
}
