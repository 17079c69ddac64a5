//! Domain methods for the content service client.
//!
//! Each method makes exactly one request and maps any non-success outcome to
//! the matching [`IngestError`] variant. Retrying is up to the caller.

use crate::{error_body, ApiClient, POSTS_PATH, UPLOAD_URL_PATH};
use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, StatusCode};
use serde_json::Value;
use std::path::Path;
use tokio_util::io::ReaderStream;
use vidpost_core::{
    ContentService, CreatePostRequest, IngestError, IngestResult, PostReceipt, UploadDestination,
};

impl ApiClient {
    /// Ask the service for a single-use upload URL and its content hash.
    pub async fn request_destination(&self) -> IngestResult<UploadDestination> {
        let url = self.build_url(UPLOAD_URL_PATH);
        tracing::debug!(url = %url, "Requesting upload destination");

        let request = self.apply_auth(self.client().get(&url));
        let response = request
            .send()
            .await
            .map_err(|e| IngestError::DestinationRequest {
                status: None,
                body: format!("Failed to send request: {}", e),
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "Upload destination response");
        if status != StatusCode::OK {
            return Err(IngestError::DestinationRequest {
                status: Some(status.as_u16()),
                body: error_body(response).await,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| IngestError::DestinationRequest {
                status: Some(status.as_u16()),
                body: format!("Failed to read response body: {}", e),
            })?;

        serde_json::from_str(&text).map_err(|e| IngestError::DestinationRequest {
            status: Some(status.as_u16()),
            body: format!("Unexpected upload destination payload ({}): {}", e, text),
        })
    }

    /// Stream the file at `path` as the body of a PUT to `destination.url`.
    ///
    /// The destination is an absolute, server-issued URL (usually object
    /// storage), so it is called without the service token.
    pub async fn upload_file(
        &self,
        path: &Path,
        destination: &UploadDestination,
    ) -> IngestResult<()> {
        let transfer_error = |reason: String| IngestError::UploadTransfer {
            path: path.to_path_buf(),
            reason,
        };

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| transfer_error(format!("Failed to open file: {}", e)))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| transfer_error(format!("Failed to read file metadata: {}", e)))?
            .len();

        tracing::debug!(path = %path.display(), size, url = %destination.url, "Uploading file");

        // The file handle moves into the body and is dropped when the request ends.
        let body = Body::wrap_stream(ReaderStream::new(file));
        let response = self
            .client()
            .put(&destination.url)
            .header(CONTENT_LENGTH, size)
            .body(body)
            .send()
            .await
            .map_err(|e| transfer_error(format!("Failed to send upload: {}", e)))?;

        let status = response.status();
        tracing::debug!(path = %path.display(), status = %status, "Upload response");
        if status != StatusCode::OK {
            let body = error_body(response).await;
            return Err(transfer_error(format!(
                "Upload rejected with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        // The body is cut off at `size`, so a file still being written when it
        // was opened reaches the destination truncated.
        let current = tokio::fs::metadata(path)
            .await
            .map_err(|e| transfer_error(format!("Failed to re-read file metadata: {}", e)))?
            .len();
        if current != size {
            return Err(transfer_error(format!(
                "File changed during upload: sent {} bytes, now {} bytes",
                size, current
            )));
        }

        Ok(())
    }

    /// Create a post for uploaded bytes. 200 and 201 both count as success.
    pub async fn register_post(&self, post: &CreatePostRequest) -> IngestResult<PostReceipt> {
        let url = self.build_url(POSTS_PATH);
        tracing::debug!(title = %post.title, hash = %post.hash, "Creating post");

        let request = self.apply_auth(self.client().post(&url)).json(post);
        let response = request
            .send()
            .await
            .map_err(|e| IngestError::PostCreation {
                status: None,
                body: format!("Failed to send request: {}", e),
            })?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(IngestError::PostCreation {
                status: Some(status.as_u16()),
                body: error_body(response).await,
            });
        }

        // The post exists at this point; an unreadable body is only worth a warning.
        let text = response.text().await.unwrap_or_default();
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Post creation response is not JSON");
                Value::String(text)
            })
        };

        Ok(PostReceipt {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ContentService for ApiClient {
    async fn request_destination(&self) -> IngestResult<UploadDestination> {
        ApiClient::request_destination(self).await
    }

    async fn upload_file(&self, path: &Path, destination: &UploadDestination) -> IngestResult<()> {
        ApiClient::upload_file(self, path, destination).await
    }

    async fn register_post(&self, request: &CreatePostRequest) -> IngestResult<PostReceipt> {
        ApiClient::register_post(self, request).await
    }
}
