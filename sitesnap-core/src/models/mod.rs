pub mod extension;

pub use extension::{
    ExtensionKind, ExtensionMetadata, ExtensionRecord, ExtensionStatus, InstalledExtension,
};
