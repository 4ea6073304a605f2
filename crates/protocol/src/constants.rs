use serde::{Deserialize, Serialize};

/// Content type sent when the file's MIME type is unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Reason reported when a failed response carries no `X-Reason` header.
pub const UNKNOWN_REASON: &str = "Unknown";

/// Header carrying the server's human-readable failure reason.
pub const HEADER_REASON: &str = "X-Reason";

/// Precheck header: hex SHA-256 of the content about to be sent.
pub const HEADER_SHA256: &str = "X-SHA-256";

/// Precheck header: byte length of the content about to be sent.
pub const HEADER_CONTENT_LENGTH: &str = "X-Content-Length";

/// Precheck header: MIME type of the content about to be sent.
pub const HEADER_CONTENT_TYPE: &str = "X-Content-Type";

/// Path of the server-side mirror endpoint.
pub const MIRROR_PATH: &str = "mirror";

/// Server endpoint that accepts blob bodies.
///
/// `Upload` stores bytes verbatim, so the returned descriptor must report
/// exactly the size that was sent. `Media` may transcode or strip metadata,
/// so its returned size is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadEndpoint {
    Upload,
    Media,
}

impl UploadEndpoint {
    /// Path segment relative to the server base URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Media => "media",
        }
    }

    /// Whether the server-reported size must match the local size.
    pub fn checks_size(self) -> bool {
        matches!(self, Self::Upload)
    }

    /// Operation label used in precheck failure messages.
    pub fn head_label(self) -> &'static str {
        match self {
            Self::Upload => "Head Upload",
            Self::Media => "Head Media",
        }
    }

    /// Operation label used in upload failure messages.
    pub fn put_label(self) -> &'static str {
        match self {
            Self::Upload => "Put Upload",
            Self::Media => "Put Media",
        }
    }
}

impl std::fmt::Display for UploadEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
