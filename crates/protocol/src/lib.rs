//! Wire types for the Blossom blob server HTTP protocol.
//!
//! Shared by the client and transfer crates: local file identity
//! ([`FileMetadata`]), the server acknowledgement ([`BlobDescriptor`]),
//! the mirror payload and the header names the server expects.

pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::UploadEndpoint;
pub use messages::MirrorRequest;
pub use types::{BlobDescriptor, FileMetadata, UploadProgress};
