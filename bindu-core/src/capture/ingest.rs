//! Copying a settled scanner image into application storage.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::warn;

/// MIME type for a fingerprint image extension.
pub fn image_mime(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "wsq" => "application/octet-stream",
        _ => "image/bmp",
    }
}

/// Copy `source` to `dest`, leaving the scanner's file in place.
pub async fn copy_capture(source: &Path, dest: &Path) -> std::io::Result<u64> {
    tokio::fs::copy(source, dest).await
}

/// Read `path` back as a `data:` URI for inline display.
///
/// Returns `None` if the file cannot be read; callers fall back to the path.
pub async fn inline_data_uri(path: &Path) -> Option<String> {
    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(image_mime)
        .unwrap_or("image/bmp");

    match tokio::fs::read(path).await {
        Ok(bytes) => Some(format!("data:{};base64,{}", mime, BASE64.encode(bytes))),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Error reading file for base64 conversion");
            None
        }
    }
}
