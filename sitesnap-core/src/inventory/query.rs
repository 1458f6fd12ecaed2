use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::str::FromStr;

use crate::models::ExtensionRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Version,
    Status,
    Author,
}

impl SortKey {
    fn value<'a>(&self, record: &'a ExtensionRecord) -> &'a str {
        match self {
            SortKey::Name => &record.name,
            SortKey::Version => &record.version,
            SortKey::Status => record.status.as_str(),
            SortKey::Author => &record.author,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "version" => Ok(SortKey::Version),
            "status" => Ok(SortKey::Status),
            "author" => Ok(SortKey::Author),
            other => Err(format!(
                "Unknown sort key '{}'. Valid options: name, version, status, author",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Search and ordering applied to a collected list for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl ListingQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term)
        };
        self
    }

    pub fn sorted_by(mut self, sort: SortKey, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn matches(&self, record: &ExtensionRecord) -> bool {
        let Some(term) = self.search.as_deref() else {
            return true;
        };
        let term = term.to_lowercase();
        [
            record.name.as_str(),
            record.version.as_str(),
            record.status.as_str(),
            record.author.as_str(),
            record.description.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }

    pub fn apply(&self, records: &[ExtensionRecord]) -> Vec<ExtensionRecord> {
        let mut out: Vec<ExtensionRecord> =
            records.iter().filter(|r| self.matches(r)).cloned().collect();

        let key = self.sort;
        match self.direction {
            SortDirection::Asc => out.sort_by_cached_key(|r| key.value(r).to_lowercase()),
            SortDirection::Desc => {
                out.sort_by_cached_key(|r| Reverse(key.value(r).to_lowercase()))
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtensionStatus;

    fn record(name: &str, version: &str, status: ExtensionStatus, author: &str) -> ExtensionRecord {
        ExtensionRecord {
            id: format!("{}.php", name.to_lowercase()),
            name: name.to_string(),
            version: version.to_string(),
            status,
            author: author.to_string(),
            description: format!("{} does things", name),
        }
    }

    fn sample() -> Vec<ExtensionRecord> {
        vec![
            record("Akismet", "5.3", ExtensionStatus::Active, "Automattic"),
            record("hello", "1.7.2", ExtensionStatus::Inactive, "Matt"),
            record("Jetpack", "13.0", ExtensionStatus::Active, "automattic"),
        ]
    }

    #[test]
    fn test_search_case_insensitive_any_field() {
        let query = ListingQuery::new().with_search("AUTOMATTIC");
        let found = query.apply(&sample());
        assert_eq!(found.len(), 2);

        let query = ListingQuery::new().with_search("inactive");
        let found = query.apply(&sample());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "hello");
    }

    #[test]
    fn test_blank_search_matches_all() {
        let query = ListingQuery::new().with_search("   ");
        assert!(query.search.is_none());
        assert_eq!(query.apply(&sample()).len(), 3);
    }

    #[test]
    fn test_sort_desc_by_name() {
        let query = ListingQuery::new().sorted_by(SortKey::Name, SortDirection::Desc);
        let names: Vec<String> = query.apply(&sample()).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Jetpack", "hello", "Akismet"]);
    }

    #[test]
    fn test_sort_by_status_is_stable() {
        let query = ListingQuery::new().sorted_by(SortKey::Status, SortDirection::Asc);
        let names: Vec<String> = query.apply(&sample()).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Akismet", "Jetpack", "hello"]);
    }

    #[test]
    fn test_sort_desc_keeps_tie_order() {
        let records = vec![
            record("Zed", "1.0", ExtensionStatus::Active, "b"),
            record("Akismet", "2.0", ExtensionStatus::Active, "A"),
            record("hello", "3.0", ExtensionStatus::Active, "a"),
        ];
        let query = ListingQuery::new().sorted_by(SortKey::Author, SortDirection::Desc);
        let names: Vec<String> = query.apply(&records).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Zed", "Akismet", "hello"]);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("Author".parse::<SortKey>().unwrap(), SortKey::Author);
        assert!("size".parse::<SortKey>().is_err());
    }
}
