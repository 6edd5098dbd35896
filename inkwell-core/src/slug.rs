//! Slug generation for content files.

use regex::Regex;
use std::sync::OnceLock;

/// Extension that marks a file in the content directory as a post.
pub const CONTENT_EXTENSION: &str = ".md";

static NON_ALNUM_RUN: OnceLock<Regex> = OnceLock::new();

fn non_alnum_run() -> &'static Regex {
    NON_ALNUM_RUN.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"))
}

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Lowercase
/// - Every run of characters outside `a-z0-9` becomes a single hyphen
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use inkwell_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let lowercased = input.to_lowercase();
    let collapsed = non_alnum_run().replace_all(&lowercased, "-");
    collapsed.trim_matches('-').to_string()
}

/// Derive the slug for a content file from its file name.
///
/// The content extension is removed before slugifying, so
/// `"Hello World.md"` becomes `"hello-world"`.
pub fn slug_from_filename(filename: &str) -> String {
    let stem = filename
        .strip_suffix(CONTENT_EXTENSION)
        .unwrap_or(filename);
    slugify(stem)
}
