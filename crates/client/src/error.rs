//! Client error types.

/// Errors from the Blossom client.
///
/// `Requirement`, `Upload` and `Mirror` carry the server-authored reason
/// (or `Unknown`) so callers can show it to the user.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("upload requirement not met: {0}")]
    Requirement(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("mirror failed: {0}")]
    Mirror(String),

    #[error("malformed server response: {0}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid value for header {0}")]
    InvalidHeader(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transfer error: {0}")]
    Transfer(#[from] blossom_transfer::TransferError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Server-facing message for rejections, `None` for local failures.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Requirement(r) | Self::Upload(r) | Self::Mirror(r) => Some(r),
            _ => None,
        }
    }
}
