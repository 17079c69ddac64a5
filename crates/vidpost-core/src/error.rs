//! Error types module
//!
//! Every failure an ingestion task can hit is one variant of [`IngestError`].
//! Errors end the task that raised them; they are logged at the task boundary
//! and never reach the watcher thread or other tasks.

use std::io;
use std::path::PathBuf;

/// Log level an error should be reported at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Recoverable by re-copying the file into the watched directory
    Warn,
    /// Needs someone to look at it
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Upload destination request failed{}: {}", status_suffix(.status), .body)]
    DestinationRequest { status: Option<u16>, body: String },

    #[error("Upload of {} failed: {}", .path.display(), .reason)]
    UploadTransfer { path: PathBuf, reason: String },

    #[error("Post creation failed{}: {}", status_suffix(.status), .body)]
    PostCreation { status: Option<u16>, body: String },

    #[error("Failed to delete {} after ingestion: {}", .path.display(), .source)]
    LocalCleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {}", code),
        None => String::new(),
    }
}

/// Result type for content-service and workflow operations
pub type IngestResult<T> = Result<T, IngestError>;

impl IngestError {
    /// Machine-readable error code for log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            IngestError::DestinationRequest { .. } => "DESTINATION_REQUEST_ERROR",
            IngestError::UploadTransfer { .. } => "UPLOAD_TRANSFER_ERROR",
            IngestError::PostCreation { .. } => "POST_CREATION_ERROR",
            IngestError::LocalCleanup { .. } => "LOCAL_CLEANUP_ERROR",
        }
    }

    /// HTTP status returned by the content service, if the failure was a response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            IngestError::DestinationRequest { status, .. }
            | IngestError::PostCreation { status, .. } => *status,
            IngestError::UploadTransfer { .. } | IngestError::LocalCleanup { .. } => None,
        }
    }

    /// Whether the bytes may already be stored remotely without a post referencing them.
    pub fn leaves_orphaned_upload(&self) -> bool {
        matches!(self, IngestError::PostCreation { .. })
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            IngestError::DestinationRequest { .. } | IngestError::UploadTransfer { .. } => {
                LogLevel::Warn
            }
            // Orphaned remote object, or a local file the watcher will never see again.
            IngestError::PostCreation { .. } | IngestError::LocalCleanup { .. } => LogLevel::Error,
        }
    }
}
