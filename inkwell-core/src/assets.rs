//! Verbatim copy of the static asset tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Directory under the output root that mirrors the assets directory
pub const ASSETS_OUTPUT_DIR: &str = "assets";

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to walk assets directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to create {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {from:?} to {to:?}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Copy every file under `src` into `dest`, keeping relative paths.
///
/// Directories are visited depth-first in name order. Files already in
/// `dest` that have no source counterpart are left alone. Returns the
/// destination paths written. A missing `src` copies nothing.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<Vec<PathBuf>, AssetError> {
    let mut copied = Vec::new();
    if !src.exists() {
        tracing::debug!("Assets directory {:?} does not exist; nothing to copy", src);
        return Ok(copied);
    }

    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| AssetError::CreateDir {
                path: target.clone(),
                source,
            })?;
            continue;
        }

        fs::copy(entry.path(), &target).map_err(|source| AssetError::Copy {
            from: entry.path().to_path_buf(),
            to: target.clone(),
            source,
        })?;
        copied.push(target);
    }

    Ok(copied)
}
