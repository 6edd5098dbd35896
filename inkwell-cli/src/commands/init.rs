//! Init command implementation.

use anyhow::{Context, Result};
use include_dir::{include_dir, Dir};
use std::fs;
use std::path::{Path, PathBuf};

// Embedded so `inkwell init` works after cargo install
static SCAFFOLD: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/scaffold");

/// Initialize a new inkwell blog
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    let created = write_scaffold(&SCAFFOLD, root)?;

    println!("✓ inkwell initialized in {:?} ({} files created)", root, created.len());
    println!("  - Edit inkwell.yml to customize site metadata");
    println!("  - Write posts in content/");
    println!("  - Run `inkwell dev` to preview with live reload");
    Ok(())
}

/// Write every embedded file under `root`, skipping files that already exist
fn write_scaffold(dir: &Dir<'_>, root: &Path) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();

    for file in dir.files() {
        let target = root.join(file.path());
        if target.exists() {
            println!("{:?} already exists, leaving it alone", target);
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        fs::write(&target, file.contents())
            .with_context(|| format!("Failed to write {:?}", target))?;
        println!("Created {:?}", target);
        created.push(target);
    }

    for sub in dir.dirs() {
        created.extend(write_scaffold(sub, root)?);
    }

    Ok(created)
}
