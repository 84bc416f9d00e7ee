use std::path::{Path, PathBuf};

use manjaword_core::{Delta, DocumentPayload};
use tokio::fs;
use tracing::debug;

use crate::error::BackendError;

/// Suffix of ManjaWord document files.
pub const DOCUMENT_SUFFIX: &str = ".manjaword.json";

/// Reject paths carrying control characters.
pub fn reject_control_chars(path: &Path) -> Result<(), BackendError> {
    let as_str = path.to_string_lossy();
    if as_str.chars().any(|c| c <= '\u{1f}') {
        return Err(BackendError::InvalidPath(as_str.escape_debug().to_string()));
    }
    Ok(())
}

/// Reject paths carrying control characters or a foreign extension.
pub fn validate_document_path(path: &Path) -> Result<(), BackendError> {
    reject_control_chars(path)?;
    if !path.to_string_lossy().ends_with(DOCUMENT_SUFFIX) {
        return Err(BackendError::InvalidExtension);
    }
    Ok(())
}

/// Append the document suffix unless the path already carries it.
pub fn with_document_suffix(path: PathBuf) -> PathBuf {
    if path.to_string_lossy().ends_with(DOCUMENT_SUFFIX) {
        path
    } else {
        let mut raw = path.into_os_string();
        raw.push(DOCUMENT_SUFFIX);
        PathBuf::from(raw)
    }
}

/// Read a document envelope.
pub async fn read_document(path: &Path) -> Result<DocumentPayload, BackendError> {
    let raw = fs::read_to_string(path).await?;
    let payload: DocumentPayload = serde_json::from_str(&raw)?;
    debug!("Read document {} (format {})", path.display(), payload.version);
    Ok(payload)
}

/// Write `content` in a fresh envelope, atomically via a temp file.
pub async fn write_document(path: &Path, content: Delta) -> Result<(), BackendError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let payload = DocumentPayload::new(content);
    let json = serde_json::to_string_pretty(&payload)?;

    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    fs::write(&temp_path, json).await?;
    fs::rename(&temp_path, path).await?;

    debug!("Wrote document {}", path.display());
    Ok(())
}
