use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delta::Delta;
use crate::error::GatewayError;

/// Version written into every document envelope.
pub const DOCUMENT_FORMAT_VERSION: &str = "1.0.0";

/// Names of the commands understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandName {
    AutosaveDocument,
    RecoverUnsavedDocument,
    OpenFile,
    SaveFile,
    ExportDocx,
    ExportPdf,
    GrammarCheck,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::AutosaveDocument => "autosave_document",
            CommandName::RecoverUnsavedDocument => "recover_unsaved_document",
            CommandName::OpenFile => "open_file",
            CommandName::SaveFile => "save_file",
            CommandName::ExportDocx => "export_docx",
            CommandName::ExportPdf => "export_pdf",
            CommandName::GrammarCheck => "grammar_check",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request sent through the command gateway.
///
/// Serialized as `{"command": "save_file", "params": {"content": {...}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "params", rename_all = "snake_case")]
pub enum CommandRequest {
    AutosaveDocument { content: Delta },
    RecoverUnsavedDocument,
    OpenFile,
    SaveFile { content: Delta },
    ExportDocx { content: Delta },
    ExportPdf { content: Delta },
    GrammarCheck { text: String },
}

impl CommandRequest {
    /// The command this request invokes.
    pub fn name(&self) -> CommandName {
        match self {
            CommandRequest::AutosaveDocument { .. } => CommandName::AutosaveDocument,
            CommandRequest::RecoverUnsavedDocument => CommandName::RecoverUnsavedDocument,
            CommandRequest::OpenFile => CommandName::OpenFile,
            CommandRequest::SaveFile { .. } => CommandName::SaveFile,
            CommandRequest::ExportDocx { .. } => CommandName::ExportDocx,
            CommandRequest::ExportPdf { .. } => CommandName::ExportPdf,
            CommandRequest::GrammarCheck { .. } => CommandName::GrammarCheck,
        }
    }

    /// The document content carried by the request, if any.
    pub fn content(&self) -> Option<&Delta> {
        match self {
            CommandRequest::AutosaveDocument { content }
            | CommandRequest::SaveFile { content }
            | CommandRequest::ExportDocx { content }
            | CommandRequest::ExportPdf { content } => Some(content),
            _ => None,
        }
    }
}

/// The result of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum CommandResponse {
    /// Command with no result (autosave).
    Done,
    /// Recovery snapshot, absent when nothing was pending.
    Recovered(Option<DocumentPayload>),
    /// Opened document, absent when the user canceled.
    Opened(Option<OpenedDocument>),
    /// Destination written by save/export, absent when the user canceled.
    Written(Option<String>),
    /// Grammar check matches.
    Grammar(GrammarResponse),
}

/// Envelope of a persisted document (recovery snapshot or saved file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub content: Delta,
}

impl DocumentPayload {
    /// Wrap content in a fresh envelope stamped with the current time.
    pub fn new(content: Delta) -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION.to_string(),
            updated_at: Utc::now(),
            content,
        }
    }
}

/// A document opened from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenedDocument {
    pub path: String,
    pub content: Delta,
}

/// A single grammar-check finding, passed through from the linguistic engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarMatch {
    pub message: String,
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub replacements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarResponse {
    #[serde(default)]
    pub matches: Vec<GrammarMatch>,
}

/// Asynchronous request/response boundary to the backend.
///
/// Every backend operation goes through `invoke`. Calls are independent of each
/// other: implementations must not retry and must not impose ordering between
/// concurrent calls. Failures are returned to the caller, never swallowed.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Returns the backend identifier (e.g., "local").
    fn backend_name(&self) -> &'static str;

    /// Run a single command.
    async fn invoke(&self, request: CommandRequest) -> Result<CommandResponse, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = CommandRequest::SaveFile {
            content: Delta::sentinel(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"command": "save_file", "params": {"content": {"ops": [{"insert": "\n"}]}}})
        );

        let request = CommandRequest::GrammarCheck {
            text: "Their is".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"command": "grammar_check", "params": {"text": "Their is"}})
        );

        let request: CommandRequest =
            serde_json::from_value(json!({"command": "recover_unsaved_document"})).unwrap();
        assert_eq!(request, CommandRequest::RecoverUnsavedDocument);
    }

    #[test]
    fn test_request_names_match_wire_names() {
        let requests = [
            CommandRequest::AutosaveDocument { content: Delta::sentinel() },
            CommandRequest::RecoverUnsavedDocument,
            CommandRequest::OpenFile,
            CommandRequest::SaveFile { content: Delta::sentinel() },
            CommandRequest::ExportDocx { content: Delta::sentinel() },
            CommandRequest::ExportPdf { content: Delta::sentinel() },
            CommandRequest::GrammarCheck { text: String::new() },
        ];

        for request in requests {
            let wire = serde_json::to_value(&request).unwrap();
            assert_eq!(wire["command"], json!(request.name().as_str()));
            assert_eq!(
                request.content().is_some(),
                wire["params"].get("content").is_some()
            );
        }
    }

    #[test]
    fn test_payload_envelope_parses_saved_file() {
        let raw = json!({
            "version": "1.0.0",
            "updated_at": "2025-03-01T10:15:00+00:00",
            "content": {"ops": [{"insert": "Draft\n"}]}
        });

        let payload: DocumentPayload = serde_json::from_value(raw).unwrap();
        assert_eq!(payload.version, DOCUMENT_FORMAT_VERSION);
        assert_eq!(payload.content, Delta::from_ops(vec![]).insert("Draft\n"));
    }
}
