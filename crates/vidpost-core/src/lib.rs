//! vidpost core library
//!
//! Configuration, the ingestion error taxonomy, content-service wire models,
//! the streaming [`ContentHasher`] and the [`ContentService`] seam shared by the
//! API client, the worker and the CLI.

pub mod config;
pub mod error;
pub mod hash;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use config::{IngestConfig, LogFormat, DEFAULT_VIDEOS_DIR};
pub use error::{IngestError, IngestResult, LogLevel};
pub use hash::{ContentHasher, HASH_CHUNK_SIZE};
pub use models::{CreatePostRequest, PostReceipt, UploadDestination, DEFAULT_CATEGORY_ID};
pub use service::ContentService;
