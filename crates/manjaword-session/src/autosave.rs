use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::commands::Commands;
use crate::lock::{Operation, OperationLock};
use crate::store::DocumentStore;

/// Result of one autosave tick.
///
/// Autosave is best-effort: a failed snapshot is logged and reported here, and
/// the next tick simply tries again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveOutcome {
    /// Nothing changed since the last explicit save; no backend call.
    Clean,
    /// A user operation held the operation lock; skipped until the next tick.
    Deferred(Operation),
    /// Recovery snapshot written.
    Written,
    /// The backend rejected the snapshot.
    Failed(String),
}

/// Periodically writes a recovery snapshot while the document is dirty.
///
/// The scheduler holds the live store and reads it on every tick. A snapshot is
/// not a save: the dirty flag is left untouched.
#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    store: Arc<DocumentStore>,
    commands: Commands,
    lock: Arc<OperationLock>,
    interval: Duration,
}

impl AutosaveScheduler {
    pub fn new(
        store: Arc<DocumentStore>,
        commands: Commands,
        lock: Arc<OperationLock>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            commands,
            lock,
            interval,
        }
    }

    /// Run a single autosave pass.
    pub async fn tick(&self) -> AutosaveOutcome {
        if !self.store.is_dirty() {
            return AutosaveOutcome::Clean;
        }

        let _permit = match self.lock.try_acquire(Operation::Autosave) {
            Ok(permit) => permit,
            Err(running) => {
                debug!("Autosave deferred: {} in progress", running);
                return AutosaveOutcome::Deferred(running);
            }
        };

        // The running operation may have saved the document meanwhile
        if !self.store.is_dirty() {
            return AutosaveOutcome::Clean;
        }

        match self.commands.autosave_document(self.store.delta()).await {
            Ok(()) => {
                debug!("Recovery snapshot written");
                AutosaveOutcome::Written
            }
            Err(e) => {
                warn!("Autosave failed: {}", e);
                AutosaveOutcome::Failed(e.to_string())
            }
        }
    }

    /// Start ticking. The first tick happens one full interval from now.
    pub fn spawn(self) -> AutosaveHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!("Autosave every {} secs", period.as_secs());

            loop {
                // Only pick the branch here; the watch guard must not live across the tick
                let stop = tokio::select! {
                    _ = ticker.tick() => false,
                    _ = shutdown_rx.wait_for(|&stop| stop) => true,
                };
                if stop {
                    break;
                }
                self.tick().await;
            }

            debug!("Autosave stopped");
        });

        AutosaveHandle {
            shutdown_tx,
            task: Some(task),
        }
    }
}

/// Owner of a running autosave task. Dropping it aborts the task.
#[derive(Debug)]
pub struct AutosaveHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl AutosaveHandle {
    /// Stop the timer and wait for an in-flight tick to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
