//! Content discovery: turns the content directory into an ordered collection.

use crate::{
    frontmatter::parse_frontmatter,
    models::{sort_by_date_desc, ContentCollection, ContentRecord, Diagnostic, DiagnosticSeverity},
    slug::{slug_from_filename, CONTENT_EXTENSION},
};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to read content directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Duplicate slug '{slug}' produced by {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },
}

/// Scan `content_dir` for posts and order them newest first by `sort_field`.
///
/// A missing directory yields an empty collection. Files without a header
/// block are left out and reported as diagnostics; they do not stop the scan.
pub fn scan_content(content_dir: &Path, sort_field: &str) -> Result<ContentCollection, ScanError> {
    if !content_dir.exists() {
        tracing::info!("Content directory {:?} does not exist; no posts", content_dir);
        return Ok(ContentCollection::default());
    }

    let mut collection = ContentCollection::default();
    let mut seen: HashMap<String, String> = HashMap::new();

    for path in discover_content_files(content_dir)? {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                tracing::error!("Failed to parse {}: not valid UTF-8", filename);
                collection.diagnostics.push(unparsable(&filename, "file is not valid UTF-8"));
                continue;
            }
            Err(source) => return Err(ScanError::Read { path, source }),
        };

        let Some(doc) = parse_frontmatter(&text) else {
            tracing::error!("Failed to parse {}", filename);
            collection
                .diagnostics
                .push(unparsable(&filename, "no frontmatter block found"));
            continue;
        };

        let slug = slug_from_filename(&filename);
        if let Some(first) = seen.insert(slug.clone(), filename.clone()) {
            return Err(ScanError::DuplicateSlug {
                slug,
                first,
                second: filename,
            });
        }

        collection.records.push(ContentRecord {
            slug,
            source_filename: filename,
            metadata: doc.metadata,
            body: doc.body,
        });
    }

    sort_by_date_desc(&mut collection.records, sort_field);
    tracing::debug!(
        "Scanned {} posts ({} skipped)",
        collection.records.len(),
        collection.diagnostics.len()
    );

    Ok(collection)
}

/// Immediate children of `dir` that are content files, sorted by name
fn discover_content_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ScanError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(CONTENT_EXTENSION))
        {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn unparsable(filename: &str, reason: &str) -> Diagnostic {
    Diagnostic {
        code: "frontmatter.missing".to_string(),
        message: format!("Skipped {filename}: {reason}"),
        severity: DiagnosticSeverity::Warning,
        source_path: Some(filename.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn post(title: &str, date: &str) -> String {
        format!("---\ntitle: {title}\ndate: {date}\ndescription: about {title}\n---\nBody of {title}.\n")
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let tmp = tempdir().unwrap();
        let collection = scan_content(&tmp.path().join("nope"), "date").unwrap();
        assert!(collection.is_empty());
        assert!(collection.diagnostics.is_empty());
    }

    #[test]
    fn test_scan_orders_newest_first() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("older.md"), post("Older", "2023-05-05")).unwrap();
        fs::write(tmp.path().join("Newer Post.md"), post("Newer", "2024-01-01")).unwrap();

        let collection = scan_content(tmp.path(), "date").unwrap();
        let slugs: Vec<_> = collection.records.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["newer-post", "older"]);

        let newer = collection.find_by_slug("newer-post").unwrap();
        assert_eq!(newer.source_filename, "Newer Post.md");
        assert_eq!(newer.get("title"), Some("Newer"));
        assert_eq!(newer.body, "Body of Newer.");
    }

    #[test]
    fn test_only_markdown_files_at_top_level() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("keep.md"), post("Keep", "2024-01-01")).unwrap();
        fs::write(tmp.path().join("notes.txt"), post("Text", "2024-01-01")).unwrap();
        fs::write(tmp.path().join("draft.md.bak"), post("Bak", "2024-01-01")).unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/deep.md"), post("Deep", "2024-01-01")).unwrap();
        fs::create_dir(tmp.path().join("folder.md")).unwrap();

        let collection = scan_content(tmp.path(), "date").unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.records[0].slug, "keep");
    }

    #[test]
    fn test_unparsable_files_are_reported_and_skipped() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("good-one.md"), post("One", "2024-01-01")).unwrap();
        fs::write(tmp.path().join("good-two.md"), post("Two", "2024-02-01")).unwrap();
        fs::write(tmp.path().join("broken.md"), "# No header at all\n").unwrap();
        fs::write(tmp.path().join("binary.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let collection = scan_content(tmp.path(), "date").unwrap();
        assert_eq!(collection.len(), 2);
        assert!(collection.find_by_slug("broken").is_none());

        let skipped: Vec<_> = collection
            .diagnostics
            .iter()
            .filter_map(|d| d.source_path.as_deref())
            .collect();
        assert_eq!(skipped, vec!["binary.md", "broken.md"]);
        assert!(collection
            .diagnostics
            .iter()
            .all(|d| d.code == "frontmatter.missing"));
    }

    #[test]
    fn test_duplicate_slugs_are_rejected() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("Hello World.md"), post("A", "2024-01-01")).unwrap();
        fs::write(tmp.path().join("hello-world.md"), post("B", "2024-01-02")).unwrap();

        match scan_content(tmp.path(), "date") {
            Err(ScanError::DuplicateSlug { slug, first, second }) => {
                assert_eq!(slug, "hello-world");
                assert_eq!(first, "Hello World.md");
                assert_eq!(second, "hello-world.md");
            }
            other => panic!("expected duplicate slug error, got {other:?}"),
        }
    }
}
