//! Streaming upload bodies with throttled progress reporting.
//!
//! The pieces here know nothing about HTTP: [`ChunkStream`] turns any
//! `AsyncRead` into an ordered stream of byte chunks suitable for a request
//! body, [`ProgressThrottle`] decides when a progress snapshot is due, and
//! [`file_metadata`] derives the hash, size and MIME type of a local file.

mod chunked;
mod metadata;
mod progress;
mod types;

pub use chunked::{ChunkStream, SourceGuard, calculate_file_checksum, checksum_bytes};
pub use metadata::{detect_mime_type, file_metadata};
pub use progress::{ChannelObserver, ProgressObserver, ProgressThrottle};
pub use types::{PhaseTracker, TransferOptions, TransferPhase};

/// Default read size for each body chunk: 4 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Default minimum advance between two progress reports: 256 KiB.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 256 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a regular file: {0}")]
    NotAFile(String),
}
