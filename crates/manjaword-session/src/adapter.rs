use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use manjaword_core::{ChangeSource, Delta, EditorWidget, WidgetChange};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::store::DocumentStore;

/// Two-way bridge between the editor widget and the document store.
///
/// Widget -> store: user edits are forwarded to `DocumentStore::update` in arrival order.
/// Store -> widget: content loaded from elsewhere (open, new, recovery) is pushed with
/// `set_contents`. The widget echoes that replacement as an `Api` change, which is not
/// an edit and is never forwarded.
pub struct EditorAdapter {
    widget: Arc<dyn EditorWidget>,
    store: Arc<DocumentStore>,
    /// Replacements pushed to the widget whose `Api` echo has not been consumed yet.
    /// User changes queued before such an echo describe the replaced document.
    pending_replacements: AtomicU64,
    /// Taken at construction so every echo of `push_content` lands here, drained by `spawn`.
    changes: Mutex<Option<mpsc::UnboundedReceiver<WidgetChange>>>,
}

impl std::fmt::Debug for EditorAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorAdapter")
            .field("pending_replacements", &self.pending_replacements)
            .finish_non_exhaustive()
    }
}

impl EditorAdapter {
    /// Create the adapter and subscribe to the widget right away.
    pub fn new(widget: Arc<dyn EditorWidget>, store: Arc<DocumentStore>) -> Self {
        let changes = widget.subscribe();
        Self {
            widget,
            store,
            pending_replacements: AtomicU64::new(0),
            changes: Mutex::new(Some(changes)),
        }
    }

    /// Handle one widget change event. Returns whether the store was updated.
    pub fn apply_change(&self, change: WidgetChange) -> bool {
        match change.source {
            ChangeSource::Api => {
                // Saturating: a replacement made before this adapter existed has no pending entry
                let _ = self.pending_replacements.fetch_update(
                    Ordering::AcqRel,
                    Ordering::Acquire,
                    |n| n.checked_sub(1),
                );
                trace!("Ignoring content replacement echo");
                false
            }
            ChangeSource::User => {
                if self.pending_replacements.load(Ordering::Acquire) > 0 {
                    debug!("Dropping edit made before a content replacement");
                    return false;
                }
                self.store.update(change.delta, &change.text);
                true
            }
        }
    }

    /// Replace the widget content without marking the document dirty.
    ///
    /// Returns the widget's plain-text projection of the new content.
    pub fn push_content(&self, delta: &Delta) -> String {
        self.pending_replacements.fetch_add(1, Ordering::AcqRel);
        self.widget.set_contents(delta);
        self.widget.get_text()
    }

    /// Current plain text of the widget.
    pub fn plain_text(&self) -> String {
        self.widget.get_text()
    }

    /// Current content of the widget.
    pub fn contents(&self) -> Delta {
        self.widget.get_contents()
    }

    /// Start forwarding widget changes to the store, including those emitted since
    /// the adapter was created. The task ends when the widget drops its sender.
    ///
    /// Only the first call forwards anything; later calls return a finished task.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let taken = self
            .changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut changes) = taken else {
            warn!("Editor adapter already started");
            return tokio::spawn(async {});
        };
        let adapter = Arc::clone(self);

        tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                adapter.apply_change(change);
            }
            debug!("Editor change stream closed");
        })
    }
}
