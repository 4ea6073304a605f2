//! Blossom blob server client.
//!
//! Async HTTP client using `reqwest` for the four Blossom operations a
//! media-posting app needs:
//!
//! - **Precheck** (`HEAD /upload`, `HEAD /media`): ask whether the server
//!   will accept a described file before sending any bytes.
//! - **Upload** (`PUT /upload`): stream a file that the server stores verbatim.
//! - **Media** (`PUT /media`): stream a file the server may transcode.
//! - **Mirror** (`PUT /mirror`): have the server fetch a blob from a URL.
//!
//! Every operation is a single attempt. Errors surface unchanged; the
//! caller decides whether to retry. The authorization header value is
//! produced elsewhere and passed in as an opaque string.

pub mod client;
pub mod config;
pub mod error;
mod http;
mod response;

#[cfg(test)]
mod mock_server;

pub use client::{BlossomClient, cancellable};
pub use config::ClientConfig;
pub use error::Error;

pub use blossom_protocol::{BlobDescriptor, FileMetadata, UploadEndpoint, UploadProgress};
pub use blossom_transfer::{ChannelObserver, ProgressObserver, TransferOptions};
