//! Error types for the Sitesnap core library.
//!
//! Only authorization failures are terminal for a request. Data-shape problems in
//! discovered extensions (missing headers, empty inventories) are absorbed by the
//! collector and never surface here.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Discovery | Reading installed plugins, themes and activation state |
//! | E2001-E2099 | Config | Config file, environment and validation errors |
//! | E3001-E3099 | Authorization | Capability and anti-forgery token failures |
//! | E4001-E4099 | Export | Writing or delivering the CSV document |
//! | E9001-E9099 | General | Internal, IO and serialization errors |

use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// The main error type for the Sitesnap core library.
#[derive(Debug, Error)]
pub enum SnapError {
    // ========================================================================
    // Discovery Errors (E1001-E1099)
    // ========================================================================
    /// An extensions directory could not be enumerated
    #[error("[E1001] Failed to read extensions directory '{path}': {message}")]
    DirectoryUnreadable { path: String, message: String },

    /// The activation state file exists but could not be parsed
    #[error("[E1002] Invalid activation state file '{path}': {message}")]
    InvalidStateFile { path: String, message: String },

    // ========================================================================
    // Configuration Errors (E2001-E2099)
    // ========================================================================
    /// Configuration file parse error
    #[error("[E2001] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E2002] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    // ========================================================================
    // Authorization Errors (E3001-E3099)
    // ========================================================================
    /// Caller lacks the required capability
    #[error("[E3001] Permission denied: '{principal}' lacks capability '{capability}'")]
    PermissionDenied {
        principal: String,
        capability: String,
    },

    /// Anti-forgery token absent, malformed, expired, replayed or out of scope
    #[error("[E3002] Invalid token for action '{action}': {reason}")]
    InvalidToken { action: String, reason: String },

    // ========================================================================
    // Export Errors (E4001-E4099)
    // ========================================================================
    /// Writing the export document failed
    #[error("[E4001] Export failed: {0}")]
    ExportFailed(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (catch-all for unexpected conditions)
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("[E9002] IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("[E9003] Serialization error: {0}")]
    SerializationError(String),
}

/// Result type alias for Sitesnap operations.
pub type SnapResult<T> = Result<T, SnapError>;

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

impl From<std::io::Error> for SnapError {
    fn from(err: std::io::Error) -> Self {
        SnapError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for SnapError {
    fn from(err: serde_json::Error) -> Self {
        SnapError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for SnapError {
    fn from(err: toml::de::Error) -> Self {
        SnapError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for SnapError {
    fn from(err: config::ConfigError) -> Self {
        SnapError::ConfigParseError(err.to_string())
    }
}

impl SnapError {
    pub fn permission_denied(principal: impl Into<String>, capability: impl fmt::Display) -> Self {
        SnapError::PermissionDenied {
            principal: principal.into(),
            capability: capability.to_string(),
        }
    }

    pub fn invalid_token(action: impl fmt::Display, reason: impl Into<String>) -> Self {
        SnapError::InvalidToken {
            action: action.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this is an authorization failure (capability or token).
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            SnapError::PermissionDenied { .. } | SnapError::InvalidToken { .. }
        )
    }

    /// Check if this is a discovery error.
    pub fn is_discovery_error(&self) -> bool {
        matches!(
            self,
            SnapError::DirectoryUnreadable { .. } | SnapError::InvalidStateFile { .. }
        )
    }

    /// Check if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SnapError::ConfigParseError(_) | SnapError::InvalidConfigValue { .. }
        )
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            SnapError::DirectoryUnreadable { .. } => "E1001",
            SnapError::InvalidStateFile { .. } => "E1002",
            SnapError::ConfigParseError(_) => "E2001",
            SnapError::InvalidConfigValue { .. } => "E2002",
            SnapError::PermissionDenied { .. } => "E3001",
            SnapError::InvalidToken { .. } => "E3002",
            SnapError::ExportFailed(_) => "E4001",
            SnapError::Internal(_) => "E9001",
            SnapError::IoError(_) => "E9002",
            SnapError::SerializationError(_) => "E9003",
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            SnapError::DirectoryUnreadable { .. } => Some(
                "Check that site.root points at the site installation and that the plugins and themes directories are readable.",
            ),
            SnapError::InvalidStateFile { .. } => Some(
                "The state file must contain 'active_plugins = [..]' and 'stylesheet = \"..\"'.",
            ),
            SnapError::ConfigParseError(_) | SnapError::InvalidConfigValue { .. } => {
                Some("Check sitesnap.toml and SITESNAP_* environment variables.")
            }
            SnapError::PermissionDenied { .. } => {
                Some("Use an API key whose user has the 'manage_options' capability.")
            }
            SnapError::InvalidToken { .. } => {
                Some("Reload the dashboard to obtain a fresh token and try again.")
            }
            _ => None,
        }
    }

    /// Log this error with appropriate severity level.
    pub fn log(&self) {
        let code = self.error_code();

        if self.is_auth_error() {
            warn!(error_code = %code, "Request rejected: {}", self);
        } else {
            error!(
                error_code = %code,
                suggestion = self.user_suggestion(),
                "Error occurred: {}",
                self
            );
        }
    }
}

// ============================================================================
// User-friendly error formatting for CLI
// ============================================================================

/// Format an error for CLI display with suggestions.
pub struct CliErrorDisplay<'a> {
    error: &'a SnapError,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a SnapError) -> Self {
        Self {
            error,
            show_suggestion: true,
        }
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl<'a> fmt::Display for CliErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.error)?;

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
