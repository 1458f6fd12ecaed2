pub mod admin;
pub mod auth;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod http;
pub mod inventory;
pub mod models;

pub use admin::{AdminAction, AdminApp, AdminRequest, AdminResponse, Tab};
pub use auth::{AuthorizationPolicy, Capability, Principal, TokenAction, TokenService};
pub use config::{
    get_config_dir, AuthConfig, ConfigLoadError, ExportConfig, LoggingConfig, ServerConfig,
    SiteConfig, SiteSnapConfig, UserConfig,
};
pub use discovery::{
    ActivationState, DirectoryInventorySource, InventorySource, PluginInventory,
    StaticInventorySource, ThemeInventory,
};
pub use error::{CliErrorDisplay, SnapError, SnapResult};
pub use export::{
    Clock, DynClock, ExportDocument, FixedClock, InventoryExporter, SystemClock, CONTENT_TYPE,
    HEADER_ROW,
};
pub use inventory::{
    DynInventoryFilter, ExcludeFilter, InventoryCollector, InventoryFilter, ListingQuery,
    SortDirection, SortKey, StatusFilter,
};
pub use models::{
    ExtensionKind, ExtensionMetadata, ExtensionRecord, ExtensionStatus, InstalledExtension,
};
