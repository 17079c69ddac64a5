//! Per-file ingestion workflow.
//!
//! `Detected -> DestinationRequested -> Uploaded -> Posted -> CleanedUp`, with
//! `Failed` reachable from every non-terminal state. A failure before the
//! post is created leaves the local file in place so the file can be copied
//! in again to retry; nothing is retried automatically.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use vidpost_core::{
    ContentHasher, ContentService, CreatePostRequest, IngestError, IngestResult, LogLevel,
    PostReceipt, DEFAULT_CATEGORY_ID,
};

/// Lifecycle state of one ingestion task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Detected,
    DestinationRequested,
    Uploaded,
    Posted,
    CleanedUp,
    Failed,
}

impl IngestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestState::Detected => "detected",
            IngestState::DestinationRequested => "destination_requested",
            IngestState::Uploaded => "uploaded",
            IngestState::Posted => "posted",
            IngestState::CleanedUp => "cleaned_up",
            IngestState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestState::CleanedUp | IngestState::Failed)
    }
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a task ended.
#[derive(Debug)]
pub enum IngestOutcome {
    Completed {
        path: PathBuf,
        post_id: Option<String>,
    },
    Failed {
        path: PathBuf,
        /// Last state reached before the failing step.
        failed_in: IngestState,
        error: IngestError,
    },
}

impl IngestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, IngestOutcome::Completed { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            IngestOutcome::Completed { path, .. } | IngestOutcome::Failed { path, .. } => path,
        }
    }
}

/// One file's trip through the workflow. Owned by the task running it.
struct IngestionTask {
    path: PathBuf,
    title: String,
    state: IngestState,
}

impl IngestionTask {
    fn new(path: PathBuf) -> Self {
        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            title,
            state: IngestState::Detected,
        }
    }

    fn advance(&mut self, next: IngestState) {
        tracing::debug!(
            path = %self.path.display(),
            from = %self.state,
            to = %next,
            "Ingestion state transition"
        );
        self.state = next;
    }
}

/// Runs the ingestion state machine against a [`ContentService`].
///
/// Cheap to clone; every call to [`run`](Self::run) owns its own task state.
#[derive(Clone)]
pub struct IngestionWorkflow {
    service: Arc<dyn ContentService>,
    category_id: i64,
    log_local_digest: bool,
}

impl IngestionWorkflow {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self {
            service,
            category_id: DEFAULT_CATEGORY_ID,
            log_local_digest: false,
        }
    }

    /// Log a locally computed SHA-256 before uploading. Diagnostic only; the
    /// post is always registered with the hash the service issued.
    pub fn with_local_digest(mut self, enabled: bool) -> Self {
        self.log_local_digest = enabled;
        self
    }

    /// Carry `path` through the whole workflow. Never panics or propagates;
    /// every error ends up in the returned outcome.
    pub async fn run(&self, path: PathBuf) -> IngestOutcome {
        let mut task = IngestionTask::new(path);
        tracing::info!(path = %task.path.display(), title = %task.title, "Processing file");

        match self.drive(&mut task).await {
            Ok(receipt) => {
                let post_id = receipt.id();
                tracing::info!(
                    path = %task.path.display(),
                    post_id = post_id.as_deref().unwrap_or("-"),
                    "File ingested and removed"
                );
                IngestOutcome::Completed {
                    path: task.path,
                    post_id,
                }
            }
            Err(error) => {
                let failed_in = task.state;
                task.state = IngestState::Failed;
                log_failure(&task.path, failed_in, &error);
                IngestOutcome::Failed {
                    path: task.path,
                    failed_in,
                    error,
                }
            }
        }
    }

    async fn drive(&self, task: &mut IngestionTask) -> IngestResult<PostReceipt> {
        if self.log_local_digest {
            self.log_digest(&task.path).await;
        }

        let destination = self.service.request_destination().await?;
        task.advance(IngestState::DestinationRequested);
        tracing::info!(path = %task.path.display(), hash = %destination.hash, "Upload destination issued");

        self.service.upload_file(&task.path, &destination).await?;
        task.advance(IngestState::Uploaded);
        tracing::info!(path = %task.path.display(), "Video uploaded");

        let request =
            CreatePostRequest::private(task.title.clone(), destination.hash, self.category_id);
        let receipt = self.service.register_post(&request).await?;
        task.advance(IngestState::Posted);
        tracing::info!(path = %task.path.display(), status = receipt.status, "Post created");

        tokio::fs::remove_file(&task.path)
            .await
            .map_err(|source| IngestError::LocalCleanup {
                path: task.path.clone(),
                source,
            })?;
        task.advance(IngestState::CleanedUp);

        Ok(receipt)
    }

    async fn log_digest(&self, path: &Path) {
        let owned = path.to_path_buf();
        let digest =
            tokio::task::spawn_blocking(move || ContentHasher::new().digest_file(&owned)).await;
        match digest {
            Ok(Ok(digest)) => tracing::debug!(path = %path.display(), sha256 = %digest, "Local digest"),
            Ok(Err(e)) => tracing::debug!(path = %path.display(), error = %e, "Local digest unavailable"),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "Digest task failed"),
        }
    }
}

fn log_failure(path: &Path, failed_in: IngestState, error: &IngestError) {
    match error.log_level() {
        LogLevel::Warn => tracing::warn!(
            path = %path.display(),
            failed_in = %failed_in,
            code = error.error_code(),
            error = %error,
            "Ingestion failed, local file kept"
        ),
        LogLevel::Error => tracing::error!(
            path = %path.display(),
            failed_in = %failed_in,
            code = error.error_code(),
            orphaned_upload = error.leaves_orphaned_upload(),
            error = %error,
            "Ingestion failed"
        ),
    }
}
