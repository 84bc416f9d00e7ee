use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::adapter::EditorAdapter;
use crate::commands::Commands;
use crate::store::DocumentStore;

/// What startup recovery found.
///
/// Recovery is best-effort: failures are reported here and logged, never
/// returned as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// An unsaved document was restored into the session.
    Restored { updated_at: DateTime<Utc> },
    /// Nothing was pending.
    Empty,
    /// The backend could not provide a snapshot; the session starts empty.
    Unavailable(String),
    /// Recovery already ran for this session.
    AlreadyRan,
}

/// Loads the crash-recovery snapshot into a fresh session, once.
#[derive(Debug)]
pub struct RecoveryLoader {
    commands: Commands,
    adapter: Arc<EditorAdapter>,
    store: Arc<DocumentStore>,
    ran: AtomicBool,
}

impl RecoveryLoader {
    pub fn new(commands: Commands, adapter: Arc<EditorAdapter>, store: Arc<DocumentStore>) -> Self {
        Self {
            commands,
            adapter,
            store,
            ran: AtomicBool::new(false),
        }
    }

    /// Ask the backend for an unsaved document and seed the session with it.
    ///
    /// A restored document is marked dirty: it was unsaved when the previous
    /// session ended, even though nothing was typed in this one.
    #[instrument(skip(self), level = "debug")]
    pub async fn run(&self) -> RecoveryOutcome {
        if self.ran.swap(true, Ordering::AcqRel) {
            return RecoveryOutcome::AlreadyRan;
        }

        let payload = match self.commands.recover_unsaved_document().await {
            Ok(Some(payload)) => payload,
            Ok(None) => return RecoveryOutcome::Empty,
            Err(e) => {
                warn!("Recovery unavailable, starting with an empty document: {}", e);
                return RecoveryOutcome::Unavailable(e.to_string());
            }
        };

        if payload.content.is_sentinel() {
            return RecoveryOutcome::Empty;
        }

        let text = self.adapter.push_content(&payload.content);
        self.store.load(payload.content, &text, true, None);

        info!(
            "Recovered unsaved document from {} ({} words)",
            payload.updated_at,
            self.store.word_count()
        );

        RecoveryOutcome::Restored {
            updated_at: payload.updated_at,
        }
    }
}
