use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use manjaword_core::{Delta, GrammarMatch};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Marker appended to the window title while the document has unsaved changes.
pub const DIRTY_TITLE_SUFFIX: &str = " *";

/// Presentation theme. Has no effect on document semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// Proof that a grammar check was requested under a given grammar generation.
///
/// Results carrying a ticket from an older generation are stale and get discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarTicket(u64);

/// The session state owned by the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    delta: Delta,
    dirty: bool,
    word_count: usize,
    grammar_enabled: bool,
    grammar_matches: Vec<GrammarMatch>,
    theme: Theme,
    /// File name of the opened or last saved document; `None` while untitled
    document_name: Option<String>,
    /// Bumped on every content change
    revision: u64,
    /// Bumped on every grammar state change; in-flight checks compare against it
    grammar_generation: u64,
}

impl SessionState {
    pub fn delta(&self) -> &Delta {
        &self.delta
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn grammar_enabled(&self) -> bool {
        self.grammar_enabled
    }

    pub fn grammar_matches(&self) -> &[GrammarMatch] {
        &self.grammar_matches
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document_name.as_deref()
    }

    fn clear_grammar(&mut self) {
        self.grammar_enabled = false;
        self.grammar_matches.clear();
        self.grammar_generation += 1;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            delta: Delta::sentinel(),
            dirty: false,
            word_count: 0,
            grammar_enabled: false,
            grammar_matches: Vec::new(),
            theme: Theme::default(),
            document_name: None,
            revision: 0,
            grammar_generation: 0,
        }
    }
}

/// Count the whitespace-separated tokens of a plain-text projection.
///
/// Punctuation is not a separator: "Hello world!" is two words.
pub fn count_words(text: &str) -> usize {
    text.trim().split_whitespace().count()
}

/// Single source of truth for the session state.
///
/// Every mutation goes through one of the named transitions below. The inner lock
/// is only held for the duration of a transition, never across an `.await`.
#[derive(Debug)]
pub struct DocumentStore {
    state: Mutex<SessionState>,
    title_base: String,
}

impl DocumentStore {
    /// Create a store holding the empty-document sentinel.
    pub fn new(title_base: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            title_base: title_base.into(),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Document transitions
    // =========================================================================

    /// Apply a user edit: replace the delta, recount words and mark dirty.
    pub fn update(&self, delta: Delta, plain_text: &str) {
        let mut state = self.state();
        state.delta = delta;
        state.word_count = count_words(plain_text);
        state.dirty = true;
        state.revision += 1;
        debug!("Document updated ({} words)", state.word_count);
    }

    /// Replace the whole document with content that did not come from an edit
    /// (opened file, recovered snapshot). Grammar state refers to the old text,
    /// so it is dropped.
    ///
    /// `name` is the file name shown in the title, `None` for untitled content.
    pub fn load(&self, delta: Delta, plain_text: &str, dirty: bool, name: Option<String>) {
        let mut state = self.state();
        state.delta = delta;
        state.word_count = count_words(plain_text);
        state.dirty = dirty;
        state.document_name = name;
        state.revision += 1;
        state.clear_grammar();
        debug!(
            "Document loaded ({} words, dirty={})",
            state.word_count, state.dirty
        );
    }

    /// Record a successful explicit save.
    pub fn mark_clean(&self) {
        self.state().dirty = false;
    }

    /// Record a successful save of the content at `revision` under the file `name`.
    /// Edits made while the save was in flight keep the document dirty. Returns
    /// whether it is now clean.
    pub fn mark_saved(&self, revision: u64, name: impl Into<String>) -> bool {
        let mut state = self.state();
        state.document_name = Some(name.into());
        if state.revision == revision {
            state.dirty = false;
        }
        !state.dirty
    }

    /// Back to the empty document.
    pub fn reset(&self) {
        let mut state = self.state();
        state.delta = Delta::sentinel();
        state.word_count = 0;
        state.dirty = false;
        state.document_name = None;
        state.revision += 1;
        state.clear_grammar();
        debug!("Document reset");
    }

    // =========================================================================
    // Grammar transitions
    // =========================================================================

    /// Switch grammar checking on or off and invalidate every in-flight check.
    ///
    /// Switching off clears the matches immediately.
    pub fn set_grammar_enabled(&self, enabled: bool) -> GrammarTicket {
        let mut state = self.state();
        state.grammar_generation += 1;
        state.grammar_enabled = enabled;
        if !enabled {
            state.grammar_matches.clear();
        }
        GrammarTicket(state.grammar_generation)
    }

    /// Switch grammar checking off if it is on, invalidating every in-flight check.
    /// Returns whether it was on.
    pub fn disable_grammar(&self) -> bool {
        let mut state = self.state();
        if !state.grammar_enabled {
            return false;
        }
        state.clear_grammar();
        true
    }

    /// Store the matches of a finished check. Returns false (and changes nothing)
    /// when the check was superseded.
    pub fn apply_grammar_matches(&self, ticket: GrammarTicket, matches: Vec<GrammarMatch>) -> bool {
        let mut state = self.state();
        if !state.grammar_enabled || state.grammar_generation != ticket.0 {
            return false;
        }
        state.grammar_matches = matches;
        true
    }

    /// Turn grammar checking back off after a failed check. Returns false when
    /// the check was already superseded.
    pub fn abandon_grammar(&self, ticket: GrammarTicket) -> bool {
        let mut state = self.state();
        if state.grammar_generation != ticket.0 {
            return false;
        }
        state.clear_grammar();
        true
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    pub fn toggle_theme(&self) -> Theme {
        let mut state = self.state();
        state.theme = match state.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        state.theme
    }

    /// Window title: `"<base> - <name>"` once the document has a file name, the
    /// base alone while untitled, suffixed with a marker while dirty.
    pub fn title(&self) -> String {
        let state = self.state();
        let mut title = match &state.document_name {
            Some(name) => format!("{} - {}", self.title_base, name),
            None => self.title_base.clone(),
        };
        if state.dirty {
            title.push_str(DIRTY_TITLE_SUFFIX);
        }
        title
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Copy of the whole state at this instant.
    pub fn snapshot(&self) -> SessionState {
        self.state().clone()
    }

    pub fn delta(&self) -> Delta {
        self.state().delta.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.state().dirty
    }

    pub fn word_count(&self) -> usize {
        self.state().word_count
    }

    pub fn grammar_enabled(&self) -> bool {
        self.state().grammar_enabled
    }

    pub fn grammar_matches(&self) -> Vec<GrammarMatch> {
        self.state().grammar_matches.clone()
    }

    pub fn theme(&self) -> Theme {
        self.state().theme
    }

    pub fn revision(&self) -> u64 {
        self.state().revision
    }

    pub fn document_name(&self) -> Option<String> {
        self.state().document_name.clone()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TITLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar_match(message: &str) -> GrammarMatch {
        GrammarMatch {
            message: message.to_string(),
            offset: 0,
            length: 5,
            replacements: vec!["There".to_string()],
        }
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("\n"), 0);
        assert_eq!(count_words("  \t \n "), 0);
        assert_eq!(count_words("Hello"), 1);
        assert_eq!(count_words("Hello world\n"), 2);
        assert_eq!(count_words("Hello world!\n"), 2);
        assert_eq!(count_words("  Hello \n\n world  !  "), 3);
        assert_eq!(count_words("one\ttwo\u{00A0}three"), 3);
    }

    #[test]
    fn test_initial_state_is_clean_sentinel() {
        let store = DocumentStore::default();
        let state = store.snapshot();
        assert!(state.delta().is_sentinel());
        assert!(!state.is_dirty());
        assert_eq!(state.word_count(), 0);
        assert!(!state.grammar_enabled());
        assert!(state.grammar_matches().is_empty());
        assert_eq!(state.theme(), Theme::Light);
    }

    #[test]
    fn test_update_marks_dirty_and_counts() {
        let store = DocumentStore::default();
        let delta = Delta::from_ops(vec![]).insert("Hello world\n");
        store.update(delta.clone(), "Hello world\n");

        assert_eq!(store.delta(), delta);
        assert!(store.is_dirty());
        assert_eq!(store.word_count(), 2);

        // Word count always follows the last update, including back to zero
        store.update(Delta::sentinel(), "\n");
        assert_eq!(store.word_count(), 0);
        assert!(store.is_dirty());
    }

    #[test]
    fn test_mark_clean_then_edit() {
        let store = DocumentStore::default();
        store.update(Delta::from_ops(vec![]).insert("a\n"), "a\n");
        store.mark_clean();
        assert!(!store.is_dirty());

        store.update(Delta::from_ops(vec![]).insert("ab\n"), "ab\n");
        assert!(store.is_dirty());
    }

    #[test]
    fn test_mark_saved_keeps_later_edits_dirty() {
        let store = DocumentStore::default();
        store.update(Delta::from_ops(vec![]).insert("draft\n"), "draft\n");
        let saving = store.snapshot();

        // Edit lands while the save is in flight
        store.update(Delta::from_ops(vec![]).insert("draft 2\n"), "draft 2\n");
        assert!(!store.mark_saved(saving.revision(), "draft.manjaword.json"));
        assert!(store.is_dirty());

        let saving = store.snapshot();
        assert!(store.mark_saved(saving.revision(), "draft.manjaword.json"));
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_reset_from_any_state() {
        let store = DocumentStore::default();
        store.update(Delta::from_ops(vec![]).insert("Their is\n"), "Their is\n");
        let ticket = store.set_grammar_enabled(true);
        assert!(store.apply_grammar_matches(ticket, vec![grammar_match("Did you mean")]));

        store.reset();

        let state = store.snapshot();
        assert!(state.delta().is_sentinel());
        assert_eq!(state.word_count(), 0);
        assert!(state.grammar_matches().is_empty());
        assert!(!state.is_dirty());
        assert!(!state.grammar_enabled());

        // Results of checks started before the reset are stale
        assert!(!store.apply_grammar_matches(ticket, vec![grammar_match("late")]));
        assert!(store.grammar_matches().is_empty());
    }

    #[test]
    fn test_load_sets_requested_dirty_flag() {
        let store = DocumentStore::default();
        let delta = Delta::from_ops(vec![]).insert("Recovered draft\n");

        store.load(delta.clone(), "Recovered draft\n", true, None);
        assert!(store.is_dirty());
        assert_eq!(store.word_count(), 2);
        assert_eq!(store.delta(), delta);

        store.load(
            Delta::from_ops(vec![]).insert("Opened\n"),
            "Opened\n",
            false,
            Some("opened.manjaword.json".to_string()),
        );
        assert!(!store.is_dirty());
        assert_eq!(store.word_count(), 1);
    }

    #[test]
    fn test_grammar_last_toggle_wins() {
        let store = DocumentStore::default();

        let first = store.set_grammar_enabled(true);
        let _off = store.set_grammar_enabled(false);
        let second = store.set_grammar_enabled(true);

        // Response to the first request arrives after it was superseded
        assert!(!store.apply_grammar_matches(first, vec![grammar_match("stale")]));
        assert!(store.grammar_matches().is_empty());

        assert!(store.apply_grammar_matches(second, vec![grammar_match("fresh")]));
        assert_eq!(store.grammar_matches()[0].message, "fresh");

        store.set_grammar_enabled(false);
        assert!(store.grammar_matches().is_empty());
        assert!(!store.grammar_enabled());
    }

    #[test]
    fn test_disable_grammar_only_when_enabled() {
        let store = DocumentStore::default();
        assert!(!store.disable_grammar());

        let ticket = store.set_grammar_enabled(true);
        assert!(store.apply_grammar_matches(ticket, vec![grammar_match("Did you mean")]));

        assert!(store.disable_grammar());
        assert!(!store.grammar_enabled());
        assert!(store.grammar_matches().is_empty());
        assert!(!store.apply_grammar_matches(ticket, vec![grammar_match("late")]));

        assert!(!store.disable_grammar());
    }

    #[test]
    fn test_abandon_grammar_only_for_current_ticket() {
        let store = DocumentStore::default();

        let stale = store.set_grammar_enabled(true);
        let current = store.set_grammar_enabled(true);

        assert!(!store.abandon_grammar(stale));
        assert!(store.grammar_enabled());

        assert!(store.abandon_grammar(current));
        assert!(!store.grammar_enabled());
    }

    #[test]
    fn test_title_and_theme() {
        let store = DocumentStore::new("ManjaWord");
        assert_eq!(store.title(), "ManjaWord");

        store.update(Delta::from_ops(vec![]).insert("x\n"), "x\n");
        assert_eq!(store.title(), "ManjaWord *");

        store.mark_clean();
        assert_eq!(store.title(), "ManjaWord");

        assert_eq!(store.toggle_theme(), Theme::Dark);
        assert_eq!(store.toggle_theme(), Theme::Light);
    }

    #[test]
    fn test_title_follows_document_name() {
        let store = DocumentStore::new("ManjaWord");
        store.load(
            Delta::from_ops(vec![]).insert("Notes\n"),
            "Notes\n",
            false,
            Some("notes.manjaword.json".to_string()),
        );
        assert_eq!(store.title(), "ManjaWord - notes.manjaword.json");

        store.update(Delta::from_ops(vec![]).insert("Notes 2\n"), "Notes 2\n");
        assert_eq!(store.title(), "ManjaWord - notes.manjaword.json *");

        // Save As under another name
        let revision = store.snapshot().revision();
        assert!(store.mark_saved(revision, "copy.manjaword.json"));
        assert_eq!(store.title(), "ManjaWord - copy.manjaword.json");
        assert_eq!(store.document_name().as_deref(), Some("copy.manjaword.json"));

        // Recovered content has no file behind it
        store.load(Delta::from_ops(vec![]).insert("Lost\n"), "Lost\n", true, None);
        assert_eq!(store.title(), "ManjaWord *");

        store.mark_saved(store.snapshot().revision(), "lost.manjaword.json");
        store.reset();
        assert_eq!(store.title(), "ManjaWord");
        assert_eq!(store.snapshot().document_name(), None);
    }
}
