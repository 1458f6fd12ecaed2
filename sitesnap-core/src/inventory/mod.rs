mod collector;
mod filter;
mod query;

pub use collector::{normalize, sort_by_name, InventoryCollector};
pub use filter::{DynInventoryFilter, ExcludeFilter, InventoryFilter, StatusFilter};
pub use query::{ListingQuery, SortDirection, SortKey};
