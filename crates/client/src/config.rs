//! Client configuration.

use std::time::Duration;

use blossom_transfer::{DEFAULT_CHUNK_SIZE, DEFAULT_PROGRESS_INTERVAL, TransferOptions};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Settings for a [`BlossomClient`](crate::BlossomClient).
///
/// Every field has a default, so partial TOML/JSON documents deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server base URL, e.g. `https://blossom.example.com`.
    #[serde(default)]
    pub base_url: String,

    /// Bytes read from the source per body chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Minimum bytes between two progress reports.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Whole-request timeout in seconds; unset means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            chunk_size: default_chunk_size(),
            progress_interval: default_progress_interval(),
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Creates a default configuration pointing at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Checks that the configuration can drive a client.
    pub fn validate(&self) -> Result<(), Error> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("base_url is not set".into()));
        }
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "unsupported scheme {:?} in base_url",
                url.scheme()
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            chunk_size: self.chunk_size,
            progress_interval: self.progress_interval,
        }
        .normalized()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
