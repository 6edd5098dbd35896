//! Content model structs for posts, diagnostics and build results.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Header key/value pairs. The schema is decided by whoever reads them.
pub type Metadata = BTreeMap<String, String>;

/// One parsed content file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// URL slug derived from the file name (e.g., "hello-world")
    pub slug: String,

    /// File name inside the content directory, kept for diagnostics
    pub source_filename: String,

    pub metadata: Metadata,

    /// Markdown after the header, trimmed
    pub body: String,
}

impl ContentRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Parsed value of a date-like metadata field, if present and valid.
    pub fn date_value(&self, field: &str) -> Option<NaiveDateTime> {
        self.get(field).and_then(parse_date)
    }

    /// Relative output path for this record in multi-page mode
    pub fn output_rel_path(&self) -> String {
        format!("{}.html", self.slug)
    }

    /// Site-absolute URL of the generated page
    pub fn url(&self) -> String {
        format!("/{}", self.output_rel_path())
    }
}

/// Parse the date formats accepted in headers.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `YYYY-MM-DD HH:MM[:SS]`.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Order records newest first by `field`.
///
/// Records without a parseable date sort after all dated records. Ties, and
/// the relative order of undated records, are broken by slug so the result
/// does not depend on directory enumeration order.
pub fn sort_by_date_desc(records: &mut [ContentRecord], field: &str) {
    records.sort_by_cached_key(|record| (DateKey(record.date_value(field)), record.slug.clone()));
}

/// Sort key where `Some` dates come first, newest to oldest, then `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DateKey(Option<NaiveDateTime>);

impl Ord for DateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for DateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Warning,
    Error,
}

/// A problem found while building that did not stop the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub source_path: Option<String>,
}

/// The posts found by one scan, plus the files that were left out.
#[derive(Debug, Clone, Default)]
pub struct ContentCollection {
    /// Newest first
    pub records: Vec<ContentRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ContentCollection {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&ContentRecord> {
        self.records.iter().find(|r| r.slug == slug)
    }
}

/// Files written by one build pass
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub posts: usize,
    pub pages_written: Vec<PathBuf>,
    /// Pages left by an earlier build that this one no longer produces
    pub pages_removed: Vec<PathBuf>,
    pub assets_copied: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(slug: &str, date: Option<&str>) -> ContentRecord {
        let mut metadata = Metadata::new();
        if let Some(date) = date {
            metadata.insert("date".into(), date.into());
        }
        ContentRecord {
            slug: slug.into(),
            source_filename: format!("{slug}.md"),
            metadata,
            body: String::new(),
        }
    }

    fn slugs(records: &[ContentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.slug.as_str()).collect()
    }

    #[test]
    fn test_parse_date_formats() {
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date("2024-01-01"), Some(midnight));
        assert_eq!(parse_date(" 2024-01-01 "), Some(midnight));
        assert_eq!(parse_date("2024-01-01T00:00:00Z"), Some(midnight));
        assert_eq!(
            parse_date("2024-01-01 10:30"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 30, 0)
        );
        assert_eq!(parse_date("January 1st"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }

    #[test]
    fn test_newest_first() {
        let mut records = vec![record("older", Some("2023-05-05")), record("newer", Some("2024-01-01"))];
        sort_by_date_desc(&mut records, "date");
        assert_eq!(slugs(&records), vec!["newer", "older"]);
    }

    #[test]
    fn test_invalid_and_missing_dates_sort_last() {
        let mut records = vec![
            record("missing", None),
            record("garbage", Some("not a date")),
            record("old", Some("1999-12-31")),
            record("new", Some("2024-06-01")),
        ];
        sort_by_date_desc(&mut records, "date");
        assert_eq!(slugs(&records), vec!["new", "old", "garbage", "missing"]);
    }

    #[test]
    fn test_equal_dates_break_ties_by_slug() {
        let mut records = vec![
            record("b", Some("2024-01-01")),
            record("a", Some("2024-01-01")),
            record("c", Some("2024-01-01")),
        ];
        sort_by_date_desc(&mut records, "date");
        assert_eq!(slugs(&records), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_uses_requested_field() {
        let mut a = record("a", Some("2020-01-01"));
        a.metadata.insert("published".into(), "2025-01-01".into());
        let mut b = record("b", Some("2024-01-01"));
        b.metadata.insert("published".into(), "2021-01-01".into());

        let mut records = vec![b, a];
        sort_by_date_desc(&mut records, "published");
        assert_eq!(slugs(&records), vec!["a", "b"]);
    }

    #[test]
    fn test_record_paths() {
        let r = record("hello-world", None);
        assert_eq!(r.output_rel_path(), "hello-world.html");
        assert_eq!(r.url(), "/hello-world.html");
    }
}
