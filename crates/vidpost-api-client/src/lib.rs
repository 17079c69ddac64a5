//! HTTP client for the content service.
//!
//! Wraps a `reqwest::Client` with the service base URL and the `Flic-Token`
//! header. Domain methods (upload destination, byte upload, post creation)
//! live in [`api`]; [`ApiClient`] also implements
//! [`vidpost_core::ContentService`] so the worker can drive it.

pub mod api;

use anyhow::{Context, Result};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use vidpost_core::IngestConfig;

/// Header carrying the static service token.
pub const AUTH_HEADER: &str = "Flic-Token";

/// Path of the upload destination endpoint.
pub const UPLOAD_URL_PATH: &str = "/posts/generate-upload-url";

/// Path of the post creation endpoint.
pub const POSTS_PATH: &str = "/posts";

/// HTTP client for the content service.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: String, token: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        Self::new(
            config.api_base_url.clone(),
            config.token.clone(),
            config.http_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Token and JSON content type, sent on every content-service request.
    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTH_HEADER, self.token.as_str())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
    }

    /// Raw client for requests outside the content service (e.g. upload targets).
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Read a response body for diagnostics, never failing.
pub(crate) async fn error_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}
