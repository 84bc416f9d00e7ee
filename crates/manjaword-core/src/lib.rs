//! Core types and traits for the ManjaWord session layer.
//!
//! This crate defines the abstractions shared between the session layer and backend implementations:
//! - `Delta`: Opaque rich-text content exchanged with the widget and the backend
//! - `CommandGateway`: Asynchronous request/response boundary to the backend
//! - `EditorWidget`: Capability interface of the rich-text widget

mod command;
mod delta;
mod editor;
mod error;

pub use command::{
    CommandGateway, CommandName, CommandRequest, CommandResponse, DocumentPayload,
    GrammarMatch, GrammarResponse, OpenedDocument, DOCUMENT_FORMAT_VERSION,
};
pub use delta::{Delta, DeltaOp};
pub use editor::{ChangeSource, EditorWidget, WidgetChange};
pub use error::GatewayError;
