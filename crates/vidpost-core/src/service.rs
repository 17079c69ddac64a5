//! Content service abstraction
//!
//! The ingestion workflow talks to the remote service only through this
//! trait, so it can run against the HTTP client or an in-process double.

use crate::error::IngestResult;
use crate::models::{CreatePostRequest, PostReceipt, UploadDestination};
use async_trait::async_trait;
use std::path::Path;

/// Remote content service operations, one attempt each, no internal retries.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Obtain a fresh single-use upload destination.
    async fn request_destination(&self) -> IngestResult<UploadDestination>;

    /// Stream the file at `path` to `destination`.
    ///
    /// The file handle is opened and released inside this call.
    async fn upload_file(&self, path: &Path, destination: &UploadDestination) -> IngestResult<()>;

    /// Create a post referencing previously uploaded bytes.
    async fn register_post(&self, request: &CreatePostRequest) -> IngestResult<PostReceipt>;
}
