use manjaword_core::{CommandName, GatewayError};
use thiserror::Error;

/// Errors raised by the local backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("No file selected")]
    NoFile,

    #[error("Invalid file extension: expected .manjaword.json")]
    InvalidExtension,

    #[error("Path validation failed: {0}")]
    InvalidPath(String),

    #[error("Application data path unavailable")]
    PathUnavailable,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DOCX error: {0}")]
    Docx(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Grammar service unavailable: {0}")]
    GrammarUnavailable(String),
}

impl BackendError {
    /// Convert into the error reported through the command gateway.
    pub fn into_gateway(self, command: CommandName) -> GatewayError {
        GatewayError::backend(command, self)
    }
}
