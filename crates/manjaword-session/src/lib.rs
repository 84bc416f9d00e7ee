//! Session layer of the ManjaWord editor.
//!
//! Owns the live document state and coordinates everything that happens to it:
//! - `DocumentStore`: single source of truth for content, dirty flag, word count and grammar state
//! - `EditorAdapter`: bridge between the rich-text widget and the store
//! - `AutosaveScheduler`: periodic crash-recovery snapshots while the document is dirty
//! - `RecoveryLoader`: restores the last snapshot at startup
//! - `GrammarCoordinator`: on-demand grammar checks, last toggle wins
//! - `SessionController`: the document operations exposed to the presentation layer

mod adapter;
mod autosave;
mod commands;
mod config;
mod controller;
mod error;
mod grammar;
mod headless;
mod lock;
mod recovery;
mod store;

#[cfg(test)]
mod testing;

pub use adapter::EditorAdapter;
pub use autosave::{AutosaveHandle, AutosaveOutcome, AutosaveScheduler};
pub use commands::Commands;
pub use config::{SessionConfig, DEFAULT_AUTOSAVE_INTERVAL, DEFAULT_TITLE};
pub use controller::{ExportFormat, ExportOutcome, OpenOutcome, SaveOutcome, SessionController};
pub use error::{Result, SessionError};
pub use grammar::{GrammarCoordinator, GrammarOutcome};
pub use headless::HeadlessEditor;
pub use lock::{Operation, OperationLock, OperationPermit};
pub use recovery::{RecoveryLoader, RecoveryOutcome};
pub use store::{count_words, DocumentStore, GrammarTicket, SessionState, Theme, DIRTY_TITLE_SUFFIX};
