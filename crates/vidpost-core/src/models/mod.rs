//! Content service wire models
//!
//! Request and response shapes exchanged with the content service.

pub mod destination;
pub mod post;

pub use destination::UploadDestination;
pub use post::{CreatePostRequest, PostReceipt, DEFAULT_CATEGORY_ID};
