//! Outdated-package listings.
//!
//! pip can describe outdated packages as a JSON array or as text meant for
//! humans. Both are parsed into [`OutdatedListing`] and flattened straight
//! into [`PackageRef`]s, so nothing downstream cares which one was used.

use crate::error::{PipUpdateError, Result};
use crate::types::PackageRef;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

static LEGACY_ROW_RE: OnceLock<Regex> = OnceLock::new();

fn legacy_row_re() -> &'static Regex {
    LEGACY_ROW_RE.get_or_init(|| {
        Regex::new(r"^(?P<name>\S+) \((?P<current>[^)]+)\) - Latest: (?P<latest>\S+)").unwrap()
    })
}

/// One element of `pip list --outdated --format=json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructuredEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub latest_version: Option<String>,
}

/// One row of the textual `pip list --outdated` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    pub name: String,
    pub current: String,
    pub latest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutdatedListing {
    Structured(Vec<StructuredEntry>),
    LineOriented(Vec<TextRow>),
}

impl OutdatedListing {
    pub fn parse_structured(stdout: &str) -> Result<Self> {
        let entries: Vec<StructuredEntry> = serde_json::from_str(stdout.trim())?;
        Ok(OutdatedListing::Structured(entries))
    }

    /// Parse the human-readable table. Any row that cannot be read fails the
    /// whole listing.
    pub fn parse_line_oriented(stdout: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for line in stdout.lines().map(str::trim) {
            if line.is_empty() || is_header(line) || is_separator(line) {
                continue;
            }

            if let Some(caps) = legacy_row_re().captures(line) {
                rows.push(TextRow {
                    name: caps["name"].to_string(),
                    current: caps["current"].to_string(),
                    latest: caps["latest"].to_string(),
                });
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return Err(PipUpdateError::UnparseableListing(line.to_string()));
            }
            rows.push(TextRow {
                name: parts[0].to_string(),
                current: parts[1].to_string(),
                latest: parts[2].to_string(),
            });
        }
        Ok(OutdatedListing::LineOriented(rows))
    }

    pub fn source(&self) -> &'static str {
        match self {
            OutdatedListing::Structured(_) => "json",
            OutdatedListing::LineOriented(_) => "text",
        }
    }

    /// Flatten into package references, dropping entries without a name.
    pub fn into_packages(self) -> Vec<PackageRef> {
        match self {
            OutdatedListing::Structured(entries) => entries
                .into_iter()
                .filter(|e| !e.name.trim().is_empty())
                .map(|e| PackageRef::new(e.name.trim(), e.version, e.latest_version))
                .collect(),
            OutdatedListing::LineOriented(rows) => rows
                .into_iter()
                .map(|r| PackageRef::new(r.name, Some(r.current), Some(r.latest)))
                .collect(),
        }
    }
}

fn is_header(line: &str) -> bool {
    line.starts_with("Package") && line.contains("Version") && line.contains("Latest")
}

fn is_separator(line: &str) -> bool {
    line.chars().all(|c| c == '-' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_listing_maps_fields() {
        let json = r#"[
            {"name": "requests", "version": "2.28.0", "latest_version": "2.31.0", "latest_filetype": "wheel"},
            {"name": "", "version": "1.0", "latest_version": "2.0"},
            {"name": "six", "version": "1.15.0"}
        ]"#;
        let packages = OutdatedListing::parse_structured(json)
            .unwrap()
            .into_packages();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "requests");
        assert_eq!(packages[0].from_version(), "2.28.0");
        assert_eq!(packages[0].to_version(), "2.31.0");
        assert_eq!(packages[1].target_version, None);
    }

    #[test]
    fn structured_listing_rejects_non_array() {
        assert!(OutdatedListing::parse_structured("{\"name\": \"x\"}").is_err());
        assert!(OutdatedListing::parse_structured("DEPRECATION: blah").is_err());
    }

    #[test]
    fn column_table_is_parsed_in_order() {
        let text = "Package    Version Latest Type\n\
                    ---------- ------- ------ -----\n\
                    certifi    2022.1  2024.2 wheel\n\
                    urllib3    1.26.5  2.2.1  wheel\n";
        let listing = OutdatedListing::parse_line_oriented(text).unwrap();
        assert_eq!(listing.source(), "text");
        let packages = listing.into_packages();
        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["certifi", "urllib3"]);
        assert_eq!(packages[1].to_version(), "2.2.1");
    }

    #[test]
    fn legacy_rows_are_parsed() {
        let text = "setuptools (39.0.1) - Latest: 69.0.2 [wheel]\n";
        let packages = OutdatedListing::parse_line_oriented(text)
            .unwrap()
            .into_packages();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "setuptools");
        assert_eq!(packages[0].from_version(), "39.0.1");
        assert_eq!(packages[0].to_version(), "69.0.2");
    }

    #[test]
    fn short_row_fails_the_whole_listing() {
        let text = "Package Version Latest Type\n\
                    ------- ------- ------ ----\n\
                    good    1.0     2.0    wheel\n\
                    broken\n";
        let err = OutdatedListing::parse_line_oriented(text).unwrap_err();
        assert!(matches!(err, PipUpdateError::UnparseableListing(ref l) if l == "broken"));
    }

    #[test]
    fn both_sources_yield_the_same_shape() {
        let json = r#"[{"name": "idna", "version": "3.3", "latest_version": "3.6"}]"#;
        let text = "idna 3.3 3.6 wheel\n";
        let a = OutdatedListing::parse_structured(json).unwrap().into_packages();
        let b = OutdatedListing::parse_line_oriented(text)
            .unwrap()
            .into_packages();
        assert_eq!(a, b);
    }
}
