//! Dev server command: watch sources, rebuild, serve with live reload.

use super::build::build_with_config;
use crate::rebuild::RebuildQueue;
use crate::server::{self, AppState, LiveReload, ServeMode};
use anyhow::{Context, Result};
use inkwell_core::Config;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy)]
pub struct DevOptions {
    pub port: Option<u16>,
    pub mode: ServeMode,
    pub open: bool,
}

/// Start the server; in development mode also build and watch
pub async fn dev_server(config_path: &Path, options: DevOptions) -> Result<()> {
    let config = Config::load_or_default(config_path).context("Failed to load configuration")?;
    let output_dir = config.output_dir();
    let reload = LiveReload::new();

    let port = options.port.unwrap_or(match options.mode {
        ServeMode::Development => config.server.port,
        ServeMode::Production => config.server.preview_port,
    });

    // Held for the lifetime of the server
    let _dev_loop = match options.mode {
        ServeMode::Development => Some(DevLoop::start(config, reload.clone())?),
        ServeMode::Production => {
            tracing::info!("Production mode: serving existing build in {:?}", output_dir);
            None
        }
    };

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let url = format!("http://localhost:{}", port);
    tracing::info!("Starting server on {}", url);
    println!("\n  Serving at {}", url);
    println!("   Press Ctrl+C to stop\n");

    if options.open {
        if let Err(err) = open::that(&url) {
            tracing::warn!("Failed to open browser: {}", err);
        }
    }

    server::serve(listener, AppState::new(output_dir, options.mode, reload)).await
}

/// Watcher plus rebuild worker. Dropping it stops both.
pub struct DevLoop {
    _watcher: RecommendedWatcher,
    _queue: Arc<RebuildQueue>,
}

impl DevLoop {
    /// Queue the initial build and start watching every source directory
    /// that exists.
    pub fn start(config: Config, reload: LiveReload) -> Result<Self> {
        let watched = existing_dirs(config.watched_dirs());

        let queue = Arc::new(RebuildQueue::spawn(
            move || build_with_config(config.clone()),
            reload,
        ));
        queue.request();

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )
        .context("Failed to initialize file watcher")?;

        for dir in &watched {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {:?}", dir))?;
            tracing::info!("Watching {:?}", dir);
        }

        tokio::spawn(forward_changes(rx, watched, Arc::clone(&queue)));

        Ok(Self {
            _watcher: watcher,
            _queue: queue,
        })
    }
}

/// Turn watcher events into rebuild requests until the watcher goes away
async fn forward_changes(
    mut rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    watched: Vec<PathBuf>,
    queue: Arc<RebuildQueue>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            Ok(ev) => {
                if let Some(path) = changed_source(&ev, &watched) {
                    tracing::info!("Change detected in {:?}, rebuilding...", path);
                    queue.request();
                }
            }
            Err(err) => tracing::warn!("Watcher error: {}", err),
        }
    }
}

fn existing_dirs(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    dirs.into_iter()
        .filter(|dir| {
            let exists = dir.is_dir();
            if !exists {
                tracing::debug!("Not watching {:?}: directory does not exist", dir);
            }
            exists
        })
        .map(|dir| dir.canonicalize().unwrap_or(dir))
        .collect()
}

/// The first path of a create, modify or remove event that lies under a
/// watched directory
fn changed_source<'a>(event: &'a Event, watched: &[PathBuf]) -> Option<&'a Path> {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return None;
    }

    event
        .paths
        .iter()
        .find(|path| watched.iter().any(|dir| path.starts_with(dir)))
        .map(PathBuf::as_path)
}
