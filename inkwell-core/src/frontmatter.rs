//! Frontmatter parsing from markdown files.
//!
//! The header format is a deliberately small `key: value` list fenced by
//! `---` lines. There is no escaping, nesting or multi-line values.

use crate::models::Metadata;
use regex::Regex;
use std::sync::OnceLock;

/// Fence line that opens and closes the header block.
pub const DELIMITER: &str = "---";

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        // Both fences may carry trailing blanks; the closing one may end the file
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n(.*))?\z")
            .expect("static regex")
    })
}

/// A content file split into its header and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub metadata: Metadata,
    /// Markdown after the closing fence, trimmed.
    pub body: String,
}

/// Parse frontmatter from markdown content
///
/// Returns `None` when the text does not start with a fenced header block.
/// That is a normal outcome, not an error; the caller decides what it means.
///
/// # Example
///
/// ```
/// use inkwell_core::frontmatter::parse_frontmatter;
///
/// let doc = parse_frontmatter("---\ntitle: \"My Post\"\ndate: 2025-01-01\n---\n# Hello\n").unwrap();
/// assert_eq!(doc.metadata["title"], "My Post");
/// assert_eq!(doc.metadata["date"], "2025-01-01");
/// assert_eq!(doc.body, "# Hello");
/// ```
pub fn parse_frontmatter(content: &str) -> Option<ParsedDocument> {
    let captures = frontmatter_regex().captures(content)?;
    let header = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    Some(ParsedDocument {
        metadata: parse_header(header),
        body: body.trim().to_string(),
    })
}

fn parse_header(header: &str) -> Metadata {
    let mut metadata = Metadata::new();
    for line in header.lines() {
        // Split on the first colon only; values may contain more
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        metadata.insert(key.trim().to_string(), unquote(value.trim()).to_string());
    }
    metadata
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Render metadata and body back into the fenced format.
///
/// Values are written as-is, so a value whose first and last characters are
/// both `"` will lose them when parsed again.
pub fn write_frontmatter(metadata: &Metadata, body: &str) -> String {
    let mut out = String::new();
    out.push_str(DELIMITER);
    out.push('\n');
    for (key, value) in metadata {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(body);
    out.push('\n');
    out
}
