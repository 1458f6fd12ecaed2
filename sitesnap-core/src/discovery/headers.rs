//! File header parsing for plugin main files and theme stylesheets.
//!
//! Extensions declare their metadata in a comment block at the top of a file:
//!
//! ```text
//! <?php
//! /**
//!  * Plugin Name: Akismet Anti-spam
//!  * Version: 5.3
//!  * Author: Automattic
//!  */
//! ```
//!
//! Only the first [`HEADER_READ_LIMIT`] bytes of a file are considered.

use crate::models::ExtensionMetadata;

/// Number of leading bytes scanned for headers.
pub const HEADER_READ_LIMIT: usize = 8 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct HeaderSpec {
    pub name: &'static str,
    pub version: &'static str,
    pub author: &'static str,
    pub description: &'static str,
}

pub const PLUGIN_HEADERS: HeaderSpec = HeaderSpec {
    name: "Plugin Name",
    version: "Version",
    author: "Author",
    description: "Description",
};

pub const THEME_HEADERS: HeaderSpec = HeaderSpec {
    name: "Theme Name",
    version: "Version",
    author: "Author",
    description: "Description",
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHeaders {
    pub metadata: ExtensionMetadata,
    /// Whether the name header key appeared at all, even with an empty value.
    pub declares_name: bool,
}

pub fn parse_file_headers(content: &str, spec: &HeaderSpec) -> ParsedHeaders {
    let content = truncate_to_limit(content);

    let mut parsed = ParsedHeaders::default();
    let mut name_seen = false;

    for line in content.lines() {
        let line = strip_comment_prefix(line);

        if !name_seen {
            if let Some(value) = header_value(line, spec.name) {
                name_seen = true;
                parsed.declares_name = true;
                parsed.metadata.name = value;
                continue;
            }
        }
        if parsed.metadata.version.is_none() {
            if let Some(value) = header_value(line, spec.version) {
                parsed.metadata.version = value;
                continue;
            }
        }
        if parsed.metadata.author.is_none() {
            if let Some(value) = header_value(line, spec.author) {
                parsed.metadata.author = value;
                continue;
            }
        }
        if parsed.metadata.description.is_none() {
            if let Some(value) = header_value(line, spec.description) {
                parsed.metadata.description = value;
            }
        }
    }

    parsed
}

fn truncate_to_limit(content: &str) -> &str {
    if content.len() <= HEADER_READ_LIMIT {
        return content;
    }
    let mut end = HEADER_READ_LIMIT;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

fn strip_comment_prefix(line: &str) -> &str {
    let line = line.trim_start_matches([' ', '\t']);
    let line = line.strip_prefix("<?php").unwrap_or(line);
    line.trim_start_matches([' ', '\t', '/', '*', '#', '@'])
}

/// Returns `Some(value)` when `line` carries `key:`; the inner option is `None`
/// for an empty value.
fn header_value(line: &str, key: &str) -> Option<Option<String>> {
    let prefix = line.get(..key.len())?;
    if !prefix.eq_ignore_ascii_case(key) {
        return None;
    }
    let rest = line[key.len()..].strip_prefix(':')?;
    let value = clean_header_value(rest);
    Some(if value.is_empty() { None } else { Some(value) })
}

fn clean_header_value(raw: &str) -> String {
    let cut = [raw.find("*/"), raw.find("?>")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(raw.len());
    raw[..cut].trim().to_string()
}
