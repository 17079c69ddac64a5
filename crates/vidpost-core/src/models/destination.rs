use serde::{Deserialize, Serialize};

/// Server-issued upload target, valid for a single file.
///
/// `hash` is assigned by the content service before any bytes are sent and is
/// the value later used to register the post. Other fields in the response
/// are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDestination {
    pub url: String,
    pub hash: String,
}
