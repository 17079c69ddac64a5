use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category every ingested video is filed under.
pub const DEFAULT_CATEGORY_ID: i64 = 1;

/// Body of `POST /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub hash: String,
    pub is_available_in_public_feed: bool,
    pub category_id: i64,
}

impl CreatePostRequest {
    /// Private post for an uploaded file. The title is used verbatim.
    pub fn private(title: impl Into<String>, hash: impl Into<String>, category_id: i64) -> Self {
        Self {
            title: title.into(),
            hash: hash.into(),
            is_available_in_public_feed: false,
            category_id,
        }
    }
}

/// What the content service answered to a successful post creation.
///
/// Only logged; nothing downstream depends on it.
#[derive(Debug, Clone, PartialEq)]
pub struct PostReceipt {
    pub status: u16,
    pub body: Value,
}

impl PostReceipt {
    /// Top-level `id` of the response body, when present.
    pub fn id(&self) -> Option<String> {
        match self.body.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
