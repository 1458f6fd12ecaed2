use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{ExtensionKind, ExtensionRecord, ExtensionStatus};

/// Post-processing step run on each collected list.
///
/// A filter may drop, replace or append records. Appended records are not
/// re-sorted.
pub trait InventoryFilter: Send + Sync {
    fn name(&self) -> &str;

    fn filter(&self, kind: ExtensionKind, records: Vec<ExtensionRecord>) -> Vec<ExtensionRecord>;
}

pub type DynInventoryFilter = Arc<dyn InventoryFilter>;

/// Keeps only records with the given status.
pub struct StatusFilter {
    status: ExtensionStatus,
}

impl StatusFilter {
    pub fn new(status: ExtensionStatus) -> Self {
        Self { status }
    }
}

impl InventoryFilter for StatusFilter {
    fn name(&self) -> &str {
        "status"
    }

    fn filter(&self, _kind: ExtensionKind, records: Vec<ExtensionRecord>) -> Vec<ExtensionRecord> {
        records
            .into_iter()
            .filter(|r| r.status == self.status)
            .collect()
    }
}

/// Drops records by source identifier, optionally for one kind only.
pub struct ExcludeFilter {
    ids: HashSet<String>,
    kind: Option<ExtensionKind>,
}

impl ExcludeFilter {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            kind: None,
        }
    }

    pub fn for_kind(mut self, kind: ExtensionKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl InventoryFilter for ExcludeFilter {
    fn name(&self) -> &str {
        "exclude"
    }

    fn filter(&self, kind: ExtensionKind, records: Vec<ExtensionRecord>) -> Vec<ExtensionRecord> {
        if self.kind.is_some_and(|k| k != kind) {
            return records;
        }
        records
            .into_iter()
            .filter(|r| !self.ids.contains(&r.id))
            .collect()
    }
}
