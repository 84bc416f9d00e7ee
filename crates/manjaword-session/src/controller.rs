use std::path::Path;
use std::sync::Arc;

use manjaword_core::{CommandGateway, Delta, EditorWidget};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::adapter::EditorAdapter;
use crate::autosave::{AutosaveHandle, AutosaveScheduler};
use crate::commands::Commands;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::grammar::{GrammarCoordinator, GrammarOutcome};
use crate::lock::{Operation, OperationLock};
use crate::recovery::{RecoveryLoader, RecoveryOutcome};
use crate::store::{DocumentStore, SessionState, Theme};

/// Result of `SessionController::open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened { path: String },
    Canceled,
}

/// Result of `SessionController::save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { path: String },
    Canceled,
}

/// Result of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported { path: String },
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    fn operation(self) -> Operation {
        match self {
            ExportFormat::Docx => Operation::ExportDocx,
            ExportFormat::Pdf => Operation::ExportPdf,
        }
    }
}

/// File name shown in the title for a document path.
fn document_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Top-level orchestrator of an editing session.
///
/// Exposes the document operations to the presentation layer. New, Open, Save,
/// the exports and switching grammar checking on are mutually exclusive; a second
/// one started while another runs fails with `SessionError::Busy` and changes nothing.
pub struct SessionController {
    store: Arc<DocumentStore>,
    adapter: Arc<EditorAdapter>,
    commands: Commands,
    grammar: GrammarCoordinator,
    lock: Arc<OperationLock>,
    recovery: RecoveryOutcome,
    autosave: Option<AutosaveHandle>,
    adapter_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("commands", &self.commands)
            .field("recovery", &self.recovery)
            .field("running", &self.lock.running())
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Start a session: recover any unsaved document, then begin forwarding widget
    /// edits and autosaving.
    ///
    /// Returns once recovery is done, so the widget can be shown with the
    /// recovered content.
    pub async fn start(
        gateway: Arc<dyn CommandGateway>,
        widget: Arc<dyn EditorWidget>,
        config: SessionConfig,
    ) -> Self {
        let commands = Commands::new(gateway);
        let store = Arc::new(DocumentStore::new(config.title));
        let adapter = Arc::new(EditorAdapter::new(widget, store.clone()));
        let lock = OperationLock::new();

        let recovery = RecoveryLoader::new(commands.clone(), adapter.clone(), store.clone())
            .run()
            .await;
        let adapter_task = adapter.spawn();

        let autosave = AutosaveScheduler::new(
            store.clone(),
            commands.clone(),
            lock.clone(),
            config.autosave_interval,
        )
        .spawn();

        let grammar = GrammarCoordinator::new(
            store.clone(),
            adapter.clone(),
            commands.clone(),
            lock.clone(),
        );

        info!("Session started ({:?})", recovery);

        Self {
            store,
            adapter,
            commands,
            grammar,
            lock,
            recovery,
            autosave: Some(autosave),
            adapter_task: Some(adapter_task),
        }
    }

    // =========================================================================
    // Document operations
    // =========================================================================

    /// Discard the current document and start an empty one.
    ///
    /// Discarding unsaved changes also replaces the recovery snapshot with the
    /// empty document, so they are not offered again on the next start.
    #[instrument(skip(self), level = "debug")]
    pub async fn new_document(&self) -> Result<()> {
        let _permit = self.lock.acquire(Operation::New).await?;

        let discarded = self.store.is_dirty();
        self.store.reset();
        self.adapter.push_content(&Delta::sentinel());

        if discarded {
            if let Err(e) = self.commands.autosave_document(Delta::sentinel()).await {
                warn!("Could not clear recovery snapshot: {}", e);
            }
        }

        info!("New document");
        Ok(())
    }

    /// Ask the backend for a document and load it as the saved state.
    #[instrument(skip(self), level = "debug")]
    pub async fn open(&self) -> Result<OpenOutcome> {
        let _permit = self.lock.acquire(Operation::Open).await?;

        let Some(document) = self.commands.open_file().await? else {
            info!("Open canceled");
            return Ok(OpenOutcome::Canceled);
        };

        let text = self.adapter.push_content(&document.content);
        self.store
            .load(document.content, &text, false, Some(document_name(&document.path)));

        info!("Opened {}", document.path);
        Ok(OpenOutcome::Opened {
            path: document.path,
        })
    }

    /// Save the document as it is now; marks it clean on success.
    #[instrument(skip(self), level = "debug")]
    pub async fn save(&self) -> Result<SaveOutcome> {
        let _permit = self.lock.acquire(Operation::Save).await?;

        let snapshot = self.store.snapshot();
        let Some(path) = self.commands.save_file(snapshot.delta().clone()).await? else {
            info!("Save canceled");
            return Ok(SaveOutcome::Canceled);
        };

        if !self.store.mark_saved(snapshot.revision(), document_name(&path)) {
            info!("Saved {} (edited while saving, still dirty)", path);
        } else {
            info!("Saved {}", path);
        }
        Ok(SaveOutcome::Saved { path })
    }

    /// Export the document as it is now. Does not change the dirty flag.
    #[instrument(skip(self), level = "debug")]
    pub async fn export(&self, format: ExportFormat) -> Result<ExportOutcome> {
        let _permit = self.lock.acquire(format.operation()).await?;

        let content = self.store.delta();
        let written = match format {
            ExportFormat::Docx => self.commands.export_docx(content).await?,
            ExportFormat::Pdf => self.commands.export_pdf(content).await?,
        };

        Ok(match written {
            Some(path) => {
                info!("Exported {}", path);
                ExportOutcome::Exported { path }
            }
            None => {
                info!("Export canceled");
                ExportOutcome::Canceled
            }
        })
    }

    pub async fn export_docx(&self) -> Result<ExportOutcome> {
        self.export(ExportFormat::Docx).await
    }

    pub async fn export_pdf(&self) -> Result<ExportOutcome> {
        self.export(ExportFormat::Pdf).await
    }

    /// Switch grammar checking on or off.
    pub async fn toggle_grammar(&self) -> Result<GrammarOutcome> {
        self.grammar.toggle().await
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    pub fn toggle_theme(&self) -> Theme {
        self.store.toggle_theme()
    }

    pub fn title(&self) -> String {
        self.store.title()
    }

    pub fn snapshot(&self) -> SessionState {
        self.store.snapshot()
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// What recovery found when the session started.
    pub fn recovery(&self) -> &RecoveryOutcome {
        &self.recovery
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// End the session: stop autosaving and stop listening to the widget.
    pub async fn shutdown(mut self) {
        if let Some(autosave) = self.autosave.take() {
            autosave.shutdown().await;
        }
        if let Some(task) = self.adapter_task.take() {
            task.abort();
        }
        info!("Session ended");
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(task) = self.adapter_task.take() {
            task.abort();
        }
    }
}
