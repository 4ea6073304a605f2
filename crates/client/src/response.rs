//! Response validation shared by every operation.
//!
//! This is the only place errors about server responses are created; the
//! operations in [`client`](crate::client) pass them through untouched.

use blossom_protocol::constants::{HEADER_REASON, UNKNOWN_REASON};
use blossom_protocol::{BlobDescriptor, UploadEndpoint};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use crate::error::Error;

/// Operation whose response is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Precheck(UploadEndpoint),
    Upload(UploadEndpoint),
    Mirror,
}

impl Operation {
    /// Converts a server reason into this operation's error kind.
    fn rejection(self, reason: &str) -> Error {
        match self {
            Self::Precheck(endpoint) => {
                Error::Requirement(format!("{reason} ({})", endpoint.head_label()))
            }
            Self::Upload(endpoint) => Error::Upload(format!("{reason} ({})", endpoint.put_label())),
            Self::Mirror => Error::Mirror(reason.to_string()),
        }
    }
}

/// Reads the `X-Reason` header verbatim, defaulting to `Unknown` only when
/// the header is absent.
pub(crate) fn failure_reason(headers: &HeaderMap) -> String {
    headers
        .get(HEADER_REASON)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_else(|| UNKNOWN_REASON.to_string())
}

/// Fails with the operation's error kind unless `status` is 2xx.
pub(crate) fn check_status(
    operation: Operation,
    status: StatusCode,
    headers: &HeaderMap,
) -> Result<(), Error> {
    if status.is_success() {
        return Ok(());
    }
    Err(operation.rejection(&failure_reason(headers)))
}

/// Parses a success body as a [`BlobDescriptor`].
pub(crate) fn decode_descriptor(body: &[u8]) -> Result<BlobDescriptor, Error> {
    serde_json::from_slice(body).map_err(|e| Error::MalformedResponse(e.to_string()))
}

/// Verifies that the server stored exactly the bytes that were sent.
pub(crate) fn check_size(descriptor: &BlobDescriptor, expected: u64) -> Result<(), Error> {
    if descriptor.size_in_bytes == expected {
        return Ok(());
    }
    Err(Error::Upload(format!(
        "Different file size on the server: expected {expected} bytes, got {}",
        descriptor.size_in_bytes
    )))
}

/// Runs the full validation for operations that return a descriptor.
///
/// `expected_size` is `Some` only for endpoints that store bytes verbatim.
pub(crate) async fn validate_descriptor(
    operation: Operation,
    response: reqwest::Response,
    expected_size: Option<u64>,
) -> Result<BlobDescriptor, Error> {
    check_status(operation, response.status(), response.headers())?;

    let body = response.bytes().await?;
    let descriptor = decode_descriptor(&body)?;

    if let Some(expected) = expected_size {
        check_size(&descriptor, expected)?;
    }
    Ok(descriptor)
}
