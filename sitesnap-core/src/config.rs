use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::auth::{Capability, Principal};
use crate::discovery::ActivationState;
use crate::error::SnapError;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigLoadError> for SnapError {
    fn from(err: ConfigLoadError) -> Self {
        match err {
            ConfigLoadError::InvalidValue { key, message } => {
                SnapError::InvalidConfigValue { key, message }
            }
            ConfigLoadError::MissingRequired(key) => SnapError::InvalidConfigValue {
                key,
                message: "value is required".to_string(),
            },
            ConfigLoadError::Config(e) => SnapError::ConfigParseError(e.to_string()),
            ConfigLoadError::Io(e) => SnapError::IoError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteSnapConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Where the site installation lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_root")]
    pub root: PathBuf,

    /// Overrides `<root>/wp-content/plugins`.
    #[serde(default)]
    pub plugins_dir: Option<PathBuf>,

    /// Overrides `<root>/wp-content/themes`.
    #[serde(default)]
    pub themes_dir: Option<PathBuf>,

    /// Overrides `<root>/sitesnap-state.toml`.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for anti-forgery tokens. Empty means a random per-process key.
    #[serde(default)]
    pub token_secret: String,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub name: String,
    pub api_key: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl UserConfig {
    pub fn principal(&self) -> Principal {
        Principal::new(&self.name).with_capabilities(self.capabilities.iter().copied())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_site_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_token_ttl() -> u64 {
    86_400
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: default_site_root(),
            plugins_dir: None,
            themes_dir: None,
            state_file: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_secs: default_token_ttl(),
            users: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl SiteConfig {
    pub fn plugins_dir(&self) -> PathBuf {
        self.plugins_dir
            .clone()
            .unwrap_or_else(|| self.root.join("wp-content").join("plugins"))
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.themes_dir
            .clone()
            .unwrap_or_else(|| self.root.join("wp-content").join("themes"))
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| self.root.join(ActivationState::FILENAME))
    }
}

impl AuthConfig {
    pub fn token_secret(&self) -> Option<&str> {
        let secret = self.token_secret.trim();
        (!secret.is_empty()).then_some(secret)
    }

    /// Resolves a bearer API key to its configured principal.
    pub fn principal_for_key(&self, api_key: &str) -> Option<Principal> {
        self.users
            .iter()
            .find(|u| !u.api_key.is_empty() && u.api_key == api_key)
            .map(UserConfig::principal)
    }

    pub fn principal_named(&self, name: &str) -> Option<Principal> {
        self.users
            .iter()
            .find(|u| u.name == name)
            .map(UserConfig::principal)
    }
}

impl SiteSnapConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("SITESNAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;

        let mut snap_config: SiteSnapConfig = config.try_deserialize()?;

        if let Ok(level) = std::env::var("SITESNAP_LOG_LEVEL") {
            snap_config.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            snap_config.logging.level = level;
        }

        if let Ok(secret) = std::env::var("SITESNAP_TOKEN_SECRET") {
            snap_config.auth.token_secret = secret;
        }

        snap_config.validate()?;

        Ok(snap_config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.server.port == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "server.port".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "auth.token_ttl_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        for (idx, user) in self.auth.users.iter().enumerate() {
            if user.name.trim().is_empty() {
                return Err(ConfigLoadError::MissingRequired(format!(
                    "auth.users[{}].name",
                    idx
                )));
            }
            if user.api_key.trim().is_empty() {
                return Err(ConfigLoadError::InvalidValue {
                    key: format!("auth.users[{}].api_key", idx),
                    message: format!("API key for user '{}' must not be empty", user.name),
                });
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("sitesnap.toml"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    for path in get_dotenv_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn get_dotenv_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join(".env"));
    }

    paths
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sitesnap"))
}
