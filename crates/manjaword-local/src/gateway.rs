use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use manjaword_core::{
    CommandGateway, CommandName, CommandRequest, CommandResponse, Delta, GatewayError,
    OpenedDocument,
};
use tracing::{debug, info, instrument, warn};

use crate::error::BackendError;
use crate::export::{self, ExportKind};
use crate::files::{read_document, validate_document_path, with_document_suffix, write_document};
use crate::grammar::LanguageToolClient;
use crate::picker::{PathPicker, PickPurpose};
use crate::recovery::RecoveryFile;

/// Command gateway running every command in-process against the local filesystem.
pub struct LocalCommandGateway {
    recovery: RecoveryFile,
    picker: Arc<dyn PathPicker>,
    grammar: LanguageToolClient,
}

impl std::fmt::Debug for LocalCommandGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCommandGateway")
            .field("recovery", &self.recovery)
            .field("grammar", &self.grammar.url())
            .finish_non_exhaustive()
    }
}

impl LocalCommandGateway {
    pub fn new(data_dir: &Path, picker: Arc<dyn PathPicker>, grammar: LanguageToolClient) -> Self {
        Self {
            recovery: RecoveryFile::new(data_dir),
            picker,
            grammar,
        }
    }

    pub fn recovery(&self) -> &RecoveryFile {
        &self.recovery
    }

    /// Pick a path; a canceled picker surfaces as `NoFile`.
    async fn pick(&self, purpose: PickPurpose) -> Result<PathBuf, BackendError> {
        self.picker.pick(purpose).await.ok_or(BackendError::NoFile)
    }

    async fn open_file(&self) -> Result<OpenedDocument, BackendError> {
        let path = self.pick(PickPurpose::Open).await?;
        validate_document_path(&path)?;

        let payload = read_document(&path).await?;
        info!("Opened {}", path.display());

        // The document it replaces is discarded, snapshot included
        self.clear_recovery().await;
        Ok(OpenedDocument {
            path: path.display().to_string(),
            content: payload.content,
        })
    }

    async fn save_file(&self, content: Delta) -> Result<String, BackendError> {
        let path = with_document_suffix(self.pick(PickPurpose::Save).await?);
        validate_document_path(&path)?;

        write_document(&path, content).await?;
        info!("Saved {}", path.display());

        // A saved document must not come back as "unsaved" on the next start
        self.clear_recovery().await;
        Ok(path.display().to_string())
    }

    async fn clear_recovery(&self) {
        if let Err(e) = self.recovery.clear().await {
            warn!("Failed to clear recovery snapshot: {}", e);
        }
    }

    async fn export(&self, kind: ExportKind, content: Delta) -> Result<String, BackendError> {
        let purpose = match kind {
            ExportKind::Docx => PickPurpose::ExportDocx,
            ExportKind::Pdf => PickPurpose::ExportPdf,
        };
        let path = self.pick(purpose).await?;
        let written = export::export(kind, path, &content).await?;
        info!("Exported {}", written.display());
        Ok(written.display().to_string())
    }

    async fn dispatch(&self, request: CommandRequest) -> Result<CommandResponse, BackendError> {
        match request {
            // An empty snapshot has nothing to recover
            CommandRequest::AutosaveDocument { content } if content.is_sentinel() => {
                self.recovery.clear().await?;
                Ok(CommandResponse::Done)
            }
            CommandRequest::AutosaveDocument { content } => {
                self.recovery.write(content).await?;
                Ok(CommandResponse::Done)
            }
            CommandRequest::RecoverUnsavedDocument => {
                Ok(CommandResponse::Recovered(self.recovery.read().await?))
            }
            CommandRequest::OpenFile => canceled_as_none(self.open_file().await).map(CommandResponse::Opened),
            CommandRequest::SaveFile { content } => {
                canceled_as_none(self.save_file(content).await).map(CommandResponse::Written)
            }
            CommandRequest::ExportDocx { content } => {
                canceled_as_none(self.export(ExportKind::Docx, content).await).map(CommandResponse::Written)
            }
            CommandRequest::ExportPdf { content } => {
                canceled_as_none(self.export(ExportKind::Pdf, content).await).map(CommandResponse::Written)
            }
            CommandRequest::GrammarCheck { text } => {
                Ok(CommandResponse::Grammar(self.grammar.check(text).await?))
            }
        }
    }
}

/// A canceled picker is a normal outcome, not a failure.
fn canceled_as_none<T>(result: Result<T, BackendError>) -> Result<Option<T>, BackendError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(BackendError::NoFile) => {
            debug!("Picker canceled");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[async_trait]
impl CommandGateway for LocalCommandGateway {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip(self, request), fields(command = %request.name()), level = "debug")]
    async fn invoke(&self, request: CommandRequest) -> Result<CommandResponse, GatewayError> {
        let name: CommandName = request.name();
        self.dispatch(request).await.map_err(|e| {
            warn!("{} failed: {}", name, e);
            e.into_gateway(name)
        })
    }
}
