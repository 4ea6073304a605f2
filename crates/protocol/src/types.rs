use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MIME_TYPE;

/// Identity of a local file about to be sent to a blob server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Hex SHA-256 of the content.
    pub sha256: String,
    /// Exact byte length of the content.
    pub size_in_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileMetadata {
    pub fn new(sha256: impl Into<String>, size_in_bytes: u64, mime_type: Option<String>) -> Self {
        Self {
            sha256: sha256.into(),
            size_in_bytes,
            mime_type,
        }
    }

    /// MIME type to declare on the wire, falling back to a generic binary type.
    pub fn content_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE)
    }
}

/// Server acknowledgement describing a stored blob.
///
/// Fields the client does not model (NIP-94 tags, dimensions, thumbnails,
/// ...) are kept in `extra` and written back unchanged on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobDescriptor {
    pub url: String,
    pub sha256: String,
    #[serde(rename = "size")]
    pub size_in_bytes: u64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Upload time as a UNIX timestamp in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Cumulative progress of a single streaming upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Completed fraction in `0.0..=1.0`; zero-length transfers count as done.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_transferred as f64 / self.total_bytes as f64).min(1.0)
    }
}
