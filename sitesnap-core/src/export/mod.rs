pub mod clock;
pub mod serializer;
mod document;

pub use clock::{Clock, DynClock, FixedClock, SystemClock};
pub use document::{
    build_rows, export_filename, ExportDocument, InventoryExporter, CONTENT_TYPE, HEADER_ROW,
};
