use serde::{Deserialize, Serialize};

/// Body of a `PUT /mirror` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRequest {
    /// Third-party URL the server should fetch the blob from.
    pub url: String,
}

impl MirrorRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}
