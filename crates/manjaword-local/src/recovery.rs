use std::path::{Path, PathBuf};

use manjaword_core::{Delta, DocumentPayload};
use tokio::fs;
use tracing::{debug, info};

use crate::error::BackendError;
use crate::files::{read_document, write_document};

/// Name of the recovery snapshot inside the data directory.
pub const RECOVERY_FILE_NAME: &str = "autosave.manjaword.json";

/// The single crash-recovery snapshot of the local backend.
#[derive(Debug, Clone)]
pub struct RecoveryFile {
    path: PathBuf,
}

impl RecoveryFile {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(RECOVERY_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the snapshot.
    pub async fn write(&self, content: Delta) -> Result<(), BackendError> {
        write_document(&self.path, content).await
    }

    /// Read the snapshot, `None` when there is none.
    pub async fn read(&self) -> Result<Option<DocumentPayload>, BackendError> {
        if !fs::try_exists(&self.path).await? {
            debug!("No recovery snapshot at {}", self.path.display());
            return Ok(None);
        }
        read_document(&self.path).await.map(Some)
    }

    /// Remove the snapshot. Missing is fine.
    pub async fn clear(&self) -> Result<(), BackendError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Cleared recovery snapshot {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_snapshot_is_none() {
        let dir = TempDir::new().unwrap();
        let recovery = RecoveryFile::new(dir.path());

        assert!(recovery.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_creates_data_dir() {
        let dir = TempDir::new().unwrap();
        let recovery = RecoveryFile::new(&dir.path().join("manjaword"));
        let content = Delta::from_ops(vec![]).insert("unsaved\n");

        recovery.write(content.clone()).await.unwrap();

        assert!(dir.path().join("manjaword").join(RECOVERY_FILE_NAME).exists());
        assert_eq!(recovery.read().await.unwrap().unwrap().content, content);
    }

    #[tokio::test]
    async fn test_later_write_replaces_earlier() {
        let dir = TempDir::new().unwrap();
        let recovery = RecoveryFile::new(dir.path());

        recovery.write(Delta::from_ops(vec![]).insert("one\n")).await.unwrap();
        recovery.write(Delta::from_ops(vec![]).insert("two\n")).await.unwrap();

        assert_eq!(
            recovery.read().await.unwrap().unwrap().content,
            Delta::from_ops(vec![]).insert("two\n")
        );
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = TempDir::new().unwrap();
        let recovery = RecoveryFile::new(dir.path());
        recovery.write(Delta::from_ops(vec![]).insert("x\n")).await.unwrap();

        recovery.clear().await.unwrap();
        assert!(recovery.read().await.unwrap().is_none());

        // Clearing twice is not an error
        recovery.clear().await.unwrap();
    }
}
