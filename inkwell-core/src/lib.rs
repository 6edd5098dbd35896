//! # inkwell-core
//!
//! Core library for the inkwell static blog generator.
//!
//! This crate turns a directory of markdown posts with a small `key: value`
//! header into a servable site: it parses headers, scans and orders content,
//! renders pages (or a single-page payload) and writes them with the static
//! assets into the output directory.

pub mod assets;
pub mod builder;
pub mod config;
pub mod frontmatter;
pub mod markdown;
pub mod models;
pub mod render;
pub mod scan;
pub mod slug;
pub mod templates;

pub use builder::{BuildError, BuildStage, SiteBuilder, INDEX_FILE};
pub use config::{Config, MissingFieldPolicy, OutputMode};
pub use models::{BuildReport, ContentCollection, ContentRecord, Diagnostic, DiagnosticSeverity, Metadata};
pub use render::Renderer;
pub use scan::scan_content;
pub use slug::{slug_from_filename, slugify};
