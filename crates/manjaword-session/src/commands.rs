use std::sync::Arc;

use manjaword_core::{
    CommandGateway, CommandName, CommandRequest, CommandResponse, Delta, DocumentPayload,
    GatewayError, GrammarMatch, OpenedDocument,
};
use tracing::{debug, instrument};

/// Typed facade over a `CommandGateway`.
///
/// One method per backend command, each returning that command's own result type.
/// A response of the wrong shape is reported as `GatewayError::UnexpectedResponse`.
#[derive(Clone)]
pub struct Commands {
    gateway: Arc<dyn CommandGateway>,
}

impl std::fmt::Debug for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commands")
            .field("backend", &self.gateway.backend_name())
            .finish()
    }
}

fn unexpected(command: CommandName) -> GatewayError {
    GatewayError::UnexpectedResponse {
        command: command.to_string(),
    }
}

impl Commands {
    pub fn new(gateway: Arc<dyn CommandGateway>) -> Self {
        Self { gateway }
    }

    async fn invoke(&self, request: CommandRequest) -> Result<CommandResponse, GatewayError> {
        let name = request.name();
        debug!("Invoking {} on {} backend", name, self.gateway.backend_name());
        self.gateway.invoke(request).await
    }

    #[instrument(skip(self, content), level = "debug")]
    pub async fn autosave_document(&self, content: Delta) -> Result<(), GatewayError> {
        match self.invoke(CommandRequest::AutosaveDocument { content }).await? {
            CommandResponse::Done => Ok(()),
            _ => Err(unexpected(CommandName::AutosaveDocument)),
        }
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn recover_unsaved_document(&self) -> Result<Option<DocumentPayload>, GatewayError> {
        match self.invoke(CommandRequest::RecoverUnsavedDocument).await? {
            CommandResponse::Recovered(payload) => Ok(payload),
            _ => Err(unexpected(CommandName::RecoverUnsavedDocument)),
        }
    }

    /// Returns `None` when the user canceled the file picker.
    #[instrument(skip(self), level = "debug")]
    pub async fn open_file(&self) -> Result<Option<OpenedDocument>, GatewayError> {
        match self.invoke(CommandRequest::OpenFile).await? {
            CommandResponse::Opened(document) => Ok(document),
            _ => Err(unexpected(CommandName::OpenFile)),
        }
    }

    /// Returns the written path, or `None` when the user canceled.
    #[instrument(skip(self, content), level = "debug")]
    pub async fn save_file(&self, content: Delta) -> Result<Option<String>, GatewayError> {
        match self.invoke(CommandRequest::SaveFile { content }).await? {
            CommandResponse::Written(path) => Ok(path),
            _ => Err(unexpected(CommandName::SaveFile)),
        }
    }

    #[instrument(skip(self, content), level = "debug")]
    pub async fn export_docx(&self, content: Delta) -> Result<Option<String>, GatewayError> {
        match self.invoke(CommandRequest::ExportDocx { content }).await? {
            CommandResponse::Written(path) => Ok(path),
            _ => Err(unexpected(CommandName::ExportDocx)),
        }
    }

    #[instrument(skip(self, content), level = "debug")]
    pub async fn export_pdf(&self, content: Delta) -> Result<Option<String>, GatewayError> {
        match self.invoke(CommandRequest::ExportPdf { content }).await? {
            CommandResponse::Written(path) => Ok(path),
            _ => Err(unexpected(CommandName::ExportPdf)),
        }
    }

    #[instrument(skip(self, text), level = "debug", fields(text_len = text.len()))]
    pub async fn grammar_check(&self, text: String) -> Result<Vec<GrammarMatch>, GatewayError> {
        match self.invoke(CommandRequest::GrammarCheck { text }).await? {
            CommandResponse::Grammar(response) => Ok(response.matches),
            _ => Err(unexpected(CommandName::GrammarCheck)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGateway;
    use manjaword_core::GrammarResponse;

    #[tokio::test]
    async fn test_typed_results() {
        let gateway = FakeGateway::new();
        gateway.respond(
            CommandName::GrammarCheck,
            Ok(CommandResponse::Grammar(GrammarResponse {
                matches: vec![GrammarMatch {
                    message: "Possible typo".to_string(),
                    offset: 0,
                    length: 4,
                    replacements: vec!["Then".to_string()],
                }],
            })),
        );
        gateway.respond(CommandName::SaveFile, Ok(CommandResponse::Written(None)));
        let commands = Commands::new(gateway.clone());

        let matches = commands.grammar_check("Than".to_string()).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].replacements, vec!["Then".to_string()]);

        assert_eq!(commands.save_file(Delta::sentinel()).await.unwrap(), None);

        assert_eq!(
            gateway.requests(),
            vec![
                CommandRequest::GrammarCheck {
                    text: "Than".to_string()
                },
                CommandRequest::SaveFile {
                    content: Delta::sentinel()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_mismatched_response() {
        let gateway = FakeGateway::new();
        gateway.respond(CommandName::OpenFile, Ok(CommandResponse::Done));
        let commands = Commands::new(gateway);

        let err = commands.open_file().await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::UnexpectedResponse {
                command: "open_file".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_backend_failure_is_surfaced() {
        let gateway = FakeGateway::new();
        gateway.respond(
            CommandName::ExportDocx,
            Err(GatewayError::backend(CommandName::ExportDocx, "disk full")),
        );
        let commands = Commands::new(gateway);

        let err = commands.export_docx(Delta::sentinel()).await.unwrap_err();
        assert_eq!(err.to_string(), "export_docx failed: disk full");
    }
}
