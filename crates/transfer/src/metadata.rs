use std::path::Path;

use blossom_protocol::FileMetadata;
use tracing::debug;

use crate::TransferError;
use crate::chunked::calculate_file_checksum;

/// Detects the MIME type from a file extension.
///
/// Returns `None` for unknown extensions; the wire layer then falls back
/// to `application/octet-stream`.
pub fn detect_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        Some("avif") => Some("image/avif"),
        Some("heic") => Some("image/heic"),
        Some("svg") => Some("image/svg+xml"),
        Some("ico") => Some("image/x-icon"),
        Some("mp4" | "m4v") => Some("video/mp4"),
        Some("webm") => Some("video/webm"),
        Some("mov") => Some("video/quicktime"),
        Some("mp3") => Some("audio/mpeg"),
        Some("m4a") => Some("audio/mp4"),
        Some("ogg" | "oga") => Some("audio/ogg"),
        Some("wav") => Some("audio/wav"),
        Some("pdf") => Some("application/pdf"),
        Some("txt") => Some("text/plain"),
        Some("json") => Some("application/json"),
        _ => None,
    }
}

/// Builds [`FileMetadata`] for a local file by hashing its contents.
pub async fn file_metadata(path: &Path) -> Result<FileMetadata, TransferError> {
    let meta = tokio::fs::metadata(path).await?;
    if !meta.is_file() {
        return Err(TransferError::NotAFile(path.display().to_string()));
    }

    let (sha256, size) = calculate_file_checksum(path).await?;
    let mime_type = detect_mime_type(path).map(str::to_string);

    debug!(
        path = %path.display(),
        size,
        sha256 = %sha256,
        mime = mime_type.as_deref().unwrap_or("-"),
        "file metadata computed"
    );

    Ok(FileMetadata::new(sha256, size, mime_type))
}
