//! Serialized rebuilds for the dev loop.
//!
//! At most one build runs at a time. Requests that arrive while a build is
//! running collapse into a single follow-up build, so the last change is
//! always reflected without queueing one build per file event.

use crate::server::LiveReload;
use anyhow::Result;
use inkwell_core::BuildReport;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub struct RebuildQueue {
    pending: Arc<Notify>,
    worker: JoinHandle<()>,
}

impl RebuildQueue {
    /// Start the worker. Successful builds broadcast a reload; failures are
    /// logged and the previous output keeps being served.
    pub fn spawn<F>(build: F, reload: LiveReload) -> Self
    where
        F: Fn() -> Result<BuildReport> + Send + Sync + 'static,
    {
        let pending = Arc::new(Notify::new());
        let build = Arc::new(build);

        let worker = tokio::spawn({
            let pending = Arc::clone(&pending);
            async move {
                loop {
                    // Notify keeps at most one permit, which is the pending slot
                    pending.notified().await;

                    let build = Arc::clone(&build);
                    match tokio::task::spawn_blocking(move || build()).await {
                        Ok(Ok(report)) => {
                            tracing::info!("✓ Rebuilt {} posts", report.posts);
                            let clients = reload.broadcast();
                            tracing::debug!("Reload sent to {} clients", clients);
                        }
                        Ok(Err(err)) => tracing::error!("Rebuild failed: {:#}", err),
                        Err(err) => tracing::error!("Rebuild task failed: {}", err),
                    }
                }
            }
        });

        Self { pending, worker }
    }

    /// Ask for a build. Starts one if idle, otherwise marks one pending.
    pub fn request(&self) {
        self.pending.notify_one();
    }
}

impl Drop for RebuildQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
