//! User-facing strings for the admin shell.

pub const PAGE_TITLE: &str = "Plugin & Theme Dashboard";

pub const PAGE_DESCRIPTION: &str = "View and manage all installed plugins and themes. \
Export the complete list to CSV for documentation purposes.";

pub const EXPORT_BUTTON: &str = "Export to CSV";

pub const PERMISSION_DENIED: &str = "You do not have sufficient permissions to access this page.";

pub const SECURITY_CHECK_FAILED: &str = "Security check failed.";

pub const NO_PLUGINS: &str = "No plugins found.";

pub const NO_THEMES: &str = "No themes found.";

pub const GENERIC_ERROR: &str = "An error occurred. Please try again.";

pub const NOT_FOUND: &str = "Unknown admin action.";
