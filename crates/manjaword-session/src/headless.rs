use std::sync::{Mutex, MutexGuard, PoisonError};

use manjaword_core::{ChangeSource, Delta, DeltaOp, EditorWidget, WidgetChange};
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug)]
struct EditorState {
    contents: Delta,
    text: String,
    subscribers: Vec<mpsc::UnboundedSender<WidgetChange>>,
}

impl EditorState {
    fn emit(&mut self, source: ChangeSource) {
        let change = WidgetChange {
            delta: self.contents.clone(),
            text: self.text.clone(),
            source,
        };
        // Drop subscribers whose receiver is gone
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

/// Plain-text projection of a delta, the way the rich-text widget renders it:
/// string inserts concatenated, embeds skipped, always ending with a newline.
fn project_text(delta: &Delta) -> String {
    let mut text: String = delta
        .ops
        .iter()
        .filter_map(|op| match op {
            DeltaOp::Insert {
                insert: Value::String(s),
                ..
            } => Some(s.as_str()),
            _ => None,
        })
        .collect();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

/// Widget-less editor holding plain text.
///
/// Stands in for the rich-text widget in the command shell and in tests. User edits
/// are reported with `ChangeSource::User`, `set_contents` with `ChangeSource::Api`.
#[derive(Debug)]
pub struct HeadlessEditor {
    state: Mutex<EditorState>,
}

impl HeadlessEditor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EditorState {
                contents: Delta::sentinel(),
                text: "\n".to_string(),
                subscribers: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Type text at the end of the document, before the trailing newline.
    pub fn type_text(&self, input: &str) {
        let mut state = self.state();
        let body = state.text.strip_suffix('\n').unwrap_or(&state.text);
        let text = format!("{}{}\n", body, input);
        state.contents = Delta::from_ops(vec![]).insert(text.clone());
        state.text = text;
        state.emit(ChangeSource::User);
    }

    /// Replace the whole document as the user would (select all, then type).
    pub fn replace_text(&self, input: &str) {
        let mut state = self.state();
        let text = format!("{}\n", input.strip_suffix('\n').unwrap_or(input));
        state.contents = Delta::from_ops(vec![]).insert(text.clone());
        state.text = text;
        state.emit(ChangeSource::User);
    }
}

impl Default for HeadlessEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorWidget for HeadlessEditor {
    fn set_contents(&self, delta: &Delta) {
        let mut state = self.state();
        state.contents = delta.clone();
        state.text = project_text(delta);
        state.emit(ChangeSource::Api);
    }

    fn get_contents(&self) -> Delta {
        self.state().contents.clone()
    }

    fn get_text(&self) -> String {
        self.state().text.clone()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<WidgetChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state().subscribers.push(tx);
        rx
    }
}
