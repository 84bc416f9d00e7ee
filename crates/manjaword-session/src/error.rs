use manjaword_core::GatewayError;
use thiserror::Error;

use crate::lock::Operation;

/// Errors surfaced to the presentation layer by user-initiated operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Cannot {requested} while {running} is in progress")]
    Busy {
        requested: Operation,
        running: Operation,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
