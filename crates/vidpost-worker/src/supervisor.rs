//! Process supervisor: directory bootstrap, watch subscription, task set.
//!
//! Shutdown: [`RunningSupervisor::run_until`] stops taking events when the
//! shutdown future resolves, drops the watcher (which stops its notification
//! thread) and aborts in-flight tasks. It does not wait for them to finish.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::{JoinError, JoinSet};

use crate::dispatcher::WatchDispatcher;
use crate::workflow::{IngestOutcome, IngestionWorkflow};

/// Counts observed by the supervisor over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub dispatched: u64,
    pub completed: u64,
    pub failed: u64,
    /// Tasks still in flight at shutdown.
    pub abandoned: u64,
}

impl IngestStats {
    fn record(&mut self, joined: Result<IngestOutcome, JoinError>) {
        match joined {
            Ok(outcome) if outcome.is_success() => self.completed += 1,
            Ok(_) => self.failed += 1,
            Err(e) if e.is_cancelled() => self.abandoned += 1,
            Err(e) => {
                tracing::error!(error = %e, "ingestion task panicked");
                self.failed += 1;
            }
        }
    }
}

/// Owns the watched directory and the workflow every new video runs through.
pub struct ProcessSupervisor {
    videos_dir: PathBuf,
    workflow: IngestionWorkflow,
}

impl ProcessSupervisor {
    pub fn new(videos_dir: impl Into<PathBuf>, workflow: IngestionWorkflow) -> Self {
        Self {
            videos_dir: videos_dir.into(),
            workflow,
        }
    }

    pub fn videos_dir(&self) -> &Path {
        &self.videos_dir
    }

    /// Create the watched directory (and parents) if it does not exist.
    pub fn ensure_videos_dir(&self) -> Result<()> {
        if !self.videos_dir.exists() {
            std::fs::create_dir_all(&self.videos_dir).with_context(|| {
                format!(
                    "Failed to create videos directory {}",
                    self.videos_dir.display()
                )
            })?;
            tracing::info!(path = %self.videos_dir.display(), "Created videos directory");
        }
        Ok(())
    }

    /// Bootstrap the directory and subscribe to creation events.
    ///
    /// Events are queued from the moment this returns, so files created
    /// between `start` and `run_until` are not lost. Files already present
    /// are never picked up.
    pub fn start(self) -> Result<RunningSupervisor> {
        self.ensure_videos_dir()?;

        let (tx, queue) = mpsc::unbounded_channel();
        let dispatcher = WatchDispatcher::new(tx);

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| {
                dispatcher.handle_event(res);
            },
        )
        .context("Failed to create filesystem watcher")?;

        watcher
            .watch(&self.videos_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", self.videos_dir.display()))?;

        tracing::info!(path = %self.videos_dir.display(), "Monitoring directory");

        Ok(RunningSupervisor {
            videos_dir: self.videos_dir,
            workflow: self.workflow,
            watcher,
            queue,
        })
    }
}

/// A supervisor with an active watch subscription.
pub struct RunningSupervisor {
    videos_dir: PathBuf,
    workflow: IngestionWorkflow,
    watcher: RecommendedWatcher,
    queue: UnboundedReceiver<PathBuf>,
}

impl RunningSupervisor {
    /// Run until Ctrl-C.
    pub async fn run(self) -> IngestStats {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for interrupt signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Spawn one workflow task per queued path until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> IngestStats
    where
        F: Future<Output = ()>,
    {
        let RunningSupervisor {
            videos_dir,
            workflow,
            watcher,
            mut queue,
        } = self;

        let mut tasks: JoinSet<IngestOutcome> = JoinSet::new();
        let mut stats = IngestStats::default();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, no longer accepting new files");
                    break;
                }
                next = queue.recv() => match next {
                    Some(path) => {
                        stats.dispatched += 1;
                        let workflow = workflow.clone();
                        tasks.spawn(async move { workflow.run(path).await });
                    }
                    None => {
                        tracing::warn!("Watcher queue closed");
                        break;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    stats.record(joined);
                }
            }
        }

        // Dropping the watcher joins its notification thread.
        drop(watcher);
        queue.close();

        if !tasks.is_empty() {
            tracing::warn!(in_flight = tasks.len(), "Abandoning in-flight ingestion tasks");
        }
        tasks.abort_all();
        while let Some(joined) = tasks.join_next().await {
            stats.record(joined);
        }

        tracing::info!(
            path = %videos_dir.display(),
            dispatched = stats.dispatched,
            completed = stats.completed,
            failed = stats.failed,
            abandoned = stats.abandoned,
            "Stopped monitoring directory"
        );
        stats
    }
}
