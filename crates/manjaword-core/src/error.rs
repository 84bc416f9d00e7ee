use thiserror::Error;

/// Errors surfaced by a command gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never reached the backend, or its reply was lost.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend ran the command and reported a failure.
    #[error("{command} failed: {message}")]
    Backend { command: String, message: String },

    /// The backend answered with a result shape that does not belong to the command.
    #[error("Unexpected response to {command}")]
    UnexpectedResponse { command: String },
}

impl GatewayError {
    /// Create a backend failure for a command.
    pub fn backend(command: impl ToString, message: impl ToString) -> Self {
        Self::Backend {
            command: command.to_string(),
            message: message.to_string(),
        }
    }
}
