use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

/// What a path is being picked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickPurpose {
    Open,
    Save,
    ExportDocx,
    ExportPdf,
}

impl PickPurpose {
    pub fn default_file_name(self) -> Option<&'static str> {
        match self {
            PickPurpose::Open => None,
            PickPurpose::Save => Some("untitled.manjaword.json"),
            PickPurpose::ExportDocx => Some("document.docx"),
            PickPurpose::ExportPdf => Some("document.pdf"),
        }
    }
}

/// Source of file paths for open, save and export. `None` means the user canceled.
#[async_trait]
pub trait PathPicker: Send + Sync {
    async fn pick(&self, purpose: PickPurpose) -> Option<PathBuf>;
}

/// Picker answering from paths queued in advance, empty queue = canceled.
///
/// The command shell queues the path typed after a command before running it.
#[derive(Debug, Default)]
pub struct QueuedPicker {
    queue: Mutex<VecDeque<PathBuf>>,
}

impl QueuedPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: impl Into<PathBuf>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(path.into());
    }

    /// Forget queued paths the last command did not consume.
    pub fn clear(&self) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl PathPicker for QueuedPicker {
    async fn pick(&self, _purpose: PickPurpose) -> Option<PathBuf> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_picker_order_then_cancel() {
        let picker = QueuedPicker::new();
        picker.push("/a.manjaword.json");
        picker.push("/b.pdf");

        assert_eq!(picker.pick(PickPurpose::Open).await, Some(PathBuf::from("/a.manjaword.json")));
        assert_eq!(picker.pick(PickPurpose::ExportPdf).await, Some(PathBuf::from("/b.pdf")));
        assert_eq!(picker.pick(PickPurpose::Save).await, None);
    }

    #[tokio::test]
    async fn test_clear() {
        let picker = QueuedPicker::new();
        picker.push("/a.manjaword.json");
        picker.clear();
        assert_eq!(picker.pick(PickPurpose::Open).await, None);
    }
}
