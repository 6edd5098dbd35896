//! Build command implementation.

use anyhow::{Context, Result};
use inkwell_core::{BuildReport, Config, SiteBuilder};
use std::path::Path;

/// Build the static site once
pub fn build_site(config_path: &Path) -> Result<()> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::load_or_default(config_path).context("Failed to load configuration")?;
    let output_dir = config.output_dir();

    let report = build_with_config(config)?;

    tracing::info!(
        "✓ Built {} posts ({} pages, {} assets) into {:?}",
        report.posts,
        report.pages_written.len(),
        report.assets_copied.len(),
        output_dir
    );
    if !report.pages_removed.is_empty() {
        tracing::info!("Removed {} stale pages", report.pages_removed.len());
    }
    if !report.diagnostics.is_empty() {
        tracing::warn!("Skipped {} files", report.diagnostics.len());
    }
    Ok(())
}

/// Run one build, naming the failed stage in the error
pub fn build_with_config(config: Config) -> Result<BuildReport> {
    SiteBuilder::new(config).build().map_err(|err| {
        let stage = err.stage();
        anyhow::Error::new(err).context(format!("Build failed during {stage} stage"))
    })
}
