use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::delta::Delta;

/// Who caused a widget content change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// The user edited the document.
    User,
    /// Content was replaced programmatically through `set_contents`.
    Api,
}

/// A "content changed" event delivered by the widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetChange {
    /// Full document content after the change
    pub delta: Delta,
    /// Plain-text projection of the document after the change
    pub text: String,
    pub source: ChangeSource,
}

/// Capabilities of the rich-text widget used by the session layer.
///
/// Nothing else of the widget is ever touched, which lets a headless editor or a
/// test double stand in for the real one.
pub trait EditorWidget: Send + Sync {
    /// Replace the whole document. Must report the replacement with `ChangeSource::Api`.
    fn set_contents(&self, delta: &Delta);

    /// Current document content.
    fn get_contents(&self) -> Delta;

    /// Plain-text projection of the current document.
    fn get_text(&self) -> String;

    /// Subscribe to content changes. Events arrive in the order the widget emitted them.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<WidgetChange>;
}
