use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::adapter::EditorAdapter;
use crate::commands::Commands;
use crate::error::SessionError;
use crate::lock::{Operation, OperationLock};
use crate::store::DocumentStore;

/// Result of a grammar toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarOutcome {
    /// Checking switched on and the matches were stored.
    Applied { matches: usize },
    /// Checking switched on, but the result arrived after a later toggle and was dropped.
    Discarded,
    /// Checking switched off; matches cleared.
    Disabled,
}

/// Runs grammar checks on explicit toggle, last toggle wins.
///
/// Checks are not re-run on edits. A check whose result comes back after the user
/// toggled again (or the document was replaced) is discarded.
///
/// Switching on holds the operation lock for the duration of the check, so it is
/// refused while New, Open, Save or an export runs, and they are refused while it
/// runs. Switching off is immediate and never waits for the lock.
#[derive(Debug, Clone)]
pub struct GrammarCoordinator {
    store: Arc<DocumentStore>,
    adapter: Arc<EditorAdapter>,
    commands: Commands,
    lock: Arc<OperationLock>,
}

impl GrammarCoordinator {
    pub fn new(
        store: Arc<DocumentStore>,
        adapter: Arc<EditorAdapter>,
        commands: Commands,
        lock: Arc<OperationLock>,
    ) -> Self {
        Self {
            store,
            adapter,
            commands,
            lock,
        }
    }

    /// Switch grammar checking on (running a check) or off (clearing matches).
    ///
    /// A failed check that is still current switches checking back off and clears
    /// the matches before the error is returned, so no partial result is left behind.
    #[instrument(skip(self), level = "debug")]
    pub async fn toggle(&self) -> Result<GrammarOutcome, SessionError> {
        if self.store.disable_grammar() {
            debug!("Grammar checking disabled");
            return Ok(GrammarOutcome::Disabled);
        }

        let _permit = self.lock.acquire(Operation::Grammar).await?;
        let ticket = self.store.set_grammar_enabled(true);

        let text = self.adapter.plain_text();
        match self.commands.grammar_check(text).await {
            Ok(matches) => {
                let count = matches.len();
                if self.store.apply_grammar_matches(ticket, matches) {
                    info!("Grammar check found {} issue(s)", count);
                    Ok(GrammarOutcome::Applied { matches: count })
                } else {
                    debug!("Discarding superseded grammar result");
                    Ok(GrammarOutcome::Discarded)
                }
            }
            Err(e) => {
                if self.store.abandon_grammar(ticket) {
                    warn!("Grammar check failed: {}", e);
                    Err(e.into())
                } else {
                    debug!("Ignoring failure of superseded grammar check: {}", e);
                    Ok(GrammarOutcome::Discarded)
                }
            }
        }
    }
}
