//! Site building logic - orchestrates scanning, rendering, and output.

use crate::{
    assets::{copy_dir, AssetError, ASSETS_OUTPUT_DIR},
    config::{Config, OutputMode},
    frontmatter::parse_frontmatter,
    models::{BuildReport, ContentCollection},
    render::{RenderError, Renderer},
    scan::{scan_content, ScanError},
    templates::{PageTemplate, TemplateError},
};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output file served for `/`
pub const INDEX_FILE: &str = "index.html";

/// Step of a build, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Prepare,
    Scan,
    Render,
    Write,
    Assets,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Prepare => "prepare",
            BuildStage::Scan => "scan",
            BuildStage::Render => "render",
            BuildStage::Write => "write",
            BuildStage::Assets => "assets",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to create output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to read about page {path:?}: {source}")]
    About {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to remove stale page {path:?}: {source}")]
    Prune {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Assets(#[from] AssetError),
}

impl BuildError {
    /// The stage that failed
    pub fn stage(&self) -> BuildStage {
        match self {
            BuildError::OutputDir { .. } => BuildStage::Prepare,
            BuildError::Scan(_) => BuildStage::Scan,
            BuildError::Template(_) | BuildError::About { .. } | BuildError::Render(_) => {
                BuildStage::Render
            }
            BuildError::Prune { .. } | BuildError::Write { .. } => BuildStage::Write,
            BuildError::Assets(_) => BuildStage::Assets,
        }
    }
}

/// A generated file waiting to be written, relative to the output directory
#[derive(Debug, Clone)]
struct RenderedFile {
    rel_path: String,
    contents: String,
}

/// Main site builder
#[derive(Debug, Clone)]
pub struct SiteBuilder {
    config: Config,
    renderer: Renderer,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        let renderer =
            Renderer::new(config.missing_fields).with_site_title(config.site.title.clone());
        Self { config, renderer }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the entire site.
    ///
    /// Every record is rendered before the first file is written. Pages at
    /// the top of the output directory that this build does not produce are
    /// then removed. A failure stops the build; files already written by
    /// this or an earlier build stay on disk.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        tracing::info!("Building site...");

        let output_dir = self.config.output_dir();
        fs::create_dir_all(&output_dir).map_err(|source| BuildError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let collection = scan_content(&self.config.content_dir(), &self.config.sort_field)?;
        tracing::info!("Found {} posts", collection.len());
        for diagnostic in &collection.diagnostics {
            tracing::warn!("{}", diagnostic.message);
        }

        let rendered = match self.config.output_mode {
            OutputMode::Pages => self.render_pages(&collection)?,
            OutputMode::SinglePage => self.render_single_page(&collection)?,
        };

        let pages_removed = prune_stale_pages(&output_dir, &rendered)?;

        let mut pages_written = Vec::with_capacity(rendered.len());
        for file in rendered {
            let path = output_dir.join(&file.rel_path);
            fs::write(&path, file.contents).map_err(|source| BuildError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::debug!("  Generated {}", file.rel_path);
            pages_written.push(path);
        }

        let assets_copied = copy_dir(
            &self.config.assets_dir(),
            &output_dir.join(ASSETS_OUTPUT_DIR),
        )?;
        tracing::debug!("  Copied {} assets", assets_copied.len());

        tracing::info!("Build complete!");

        Ok(BuildReport {
            posts: collection.len(),
            pages_written,
            pages_removed,
            assets_copied,
            diagnostics: collection.diagnostics,
        })
    }

    fn render_pages(&self, collection: &ContentCollection) -> Result<Vec<RenderedFile>, BuildError> {
        let layout = self.load_template(&self.config.templates.page)?;
        let home = self.load_template(&self.config.templates.home)?;

        let mut files = Vec::with_capacity(collection.len() + 1);
        for record in &collection.records {
            files.push(RenderedFile {
                rel_path: record.output_rel_path(),
                contents: self.renderer.render_page(record, &layout)?,
            });
        }
        files.push(RenderedFile {
            rel_path: INDEX_FILE.to_string(),
            contents: self.renderer.render_home(&collection.records, &home)?,
        });

        Ok(files)
    }

    fn render_single_page(
        &self,
        collection: &ContentCollection,
    ) -> Result<Vec<RenderedFile>, BuildError> {
        let app = self.load_template(&self.config.templates.app)?;
        let about = read_about_body(&self.config.about_path())?;

        let contents = self.renderer.render_single_page(
            &collection.records,
            &about,
            &self.config.client_config(),
            &app,
        )?;

        Ok(vec![RenderedFile {
            rel_path: INDEX_FILE.to_string(),
            contents,
        }])
    }

    fn load_template(&self, name: &str) -> Result<PageTemplate, BuildError> {
        Ok(PageTemplate::load(&self.config.template_path(name))?)
    }
}

/// Remove HTML files at the top of `output_dir` that this build does not
/// produce. Subdirectories, including the assets tree, are left alone.
fn prune_stale_pages(
    output_dir: &Path,
    rendered: &[RenderedFile],
) -> Result<Vec<PathBuf>, BuildError> {
    let keep: HashSet<&str> = rendered.iter().map(|file| file.rel_path.as_str()).collect();
    let read_err = |source| BuildError::Prune {
        path: output_dir.to_path_buf(),
        source,
    };

    let mut removed = Vec::new();
    for entry in fs::read_dir(output_dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();

        let is_page = entry.file_type().is_ok_and(|t| t.is_file())
            && path.extension().is_some_and(|ext| ext == "html");
        let produced = entry
            .file_name()
            .to_str()
            .is_some_and(|name| keep.contains(name));
        if !is_page || produced {
            continue;
        }

        fs::remove_file(&path).map_err(|source| BuildError::Prune {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("  Removed stale {:?}", entry.file_name());
        removed.push(path);
    }

    removed.sort();
    Ok(removed)
}

/// Body of the about page. A file without a header is all body.
fn read_about_body(path: &Path) -> Result<String, BuildError> {
    let text = fs::read_to_string(path).map_err(|source| BuildError::About {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match parse_frontmatter(&text) {
        Some(doc) => doc.body,
        None => text.trim().to_string(),
    })
}
