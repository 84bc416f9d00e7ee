use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::debug;
use uuid::Uuid;

use crate::error::SessionError;

/// Document operations that must not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    New,
    Open,
    Save,
    ExportDocx,
    ExportPdf,
    /// Enabling grammar checking; switching it off never takes the lock
    Grammar,
    Autosave,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::New => write!(f, "create a new document"),
            Operation::Open => write!(f, "open"),
            Operation::Save => write!(f, "save"),
            Operation::ExportDocx => write!(f, "export to DOCX"),
            Operation::ExportPdf => write!(f, "export to PDF"),
            Operation::Grammar => write!(f, "check grammar"),
            Operation::Autosave => write!(f, "autosave"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Holder {
    operation: Operation,
    holder_id: Uuid,
}

/// In-process exclusive lock over the document operations.
///
/// - At most one operation holds the lock at a time
/// - User operations never queue behind each other: a second one is rejected as busy
/// - A user operation waits for a running autosave to finish instead of failing,
///   while autosave itself defers when anything else holds the lock
/// - Dropping the permit releases the lock
#[derive(Debug, Default)]
pub struct OperationLock {
    holder: Mutex<Option<Holder>>,
    released: Notify,
}

impl OperationLock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn holder(&self) -> MutexGuard<'_, Option<Holder>> {
        self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The operation currently holding the lock, if any.
    pub fn running(&self) -> Option<Operation> {
        self.holder().map(|h| h.operation)
    }

    /// Attempt to acquire the lock without waiting.
    ///
    /// # Returns
    /// * `Ok(permit)` - Lock acquired, released when the permit is dropped
    /// * `Err(running)` - The operation currently holding the lock
    pub fn try_acquire(self: &Arc<Self>, operation: Operation) -> Result<OperationPermit, Operation> {
        let mut holder = self.holder();
        if let Some(existing) = *holder {
            debug!(
                "Lock held by {} ({}), requested by {}",
                existing.operation, existing.holder_id, operation
            );
            return Err(existing.operation);
        }

        let holder_id = Uuid::new_v4();
        *holder = Some(Holder {
            operation,
            holder_id,
        });
        debug!("Acquired operation lock for {} ({})", operation, holder_id);

        Ok(OperationPermit {
            lock: Arc::clone(self),
            operation,
            holder_id,
        })
    }

    /// Acquire the lock for a user operation.
    ///
    /// Waits while an autosave is running; fails with `SessionError::Busy` when
    /// another user operation holds the lock.
    pub async fn acquire(self: &Arc<Self>, operation: Operation) -> Result<OperationPermit, SessionError> {
        loop {
            let released = self.released.notified();
            tokio::pin!(released);
            // Register before checking so a release in between is not missed
            released.as_mut().enable();

            match self.try_acquire(operation) {
                Ok(permit) => return Ok(permit),
                Err(Operation::Autosave) if operation != Operation::Autosave => {
                    debug!("{} waiting for autosave to finish", operation);
                    released.await;
                }
                Err(running) => {
                    return Err(SessionError::Busy {
                        requested: operation,
                        running,
                    })
                }
            }
        }
    }

    fn release(&self, holder_id: Uuid) {
        let mut holder = self.holder();
        match *holder {
            Some(existing) if existing.holder_id == holder_id => {
                *holder = None;
                debug!(
                    "Released operation lock for {} ({})",
                    existing.operation, holder_id
                );
            }
            _ => {
                debug!("Operation lock not held by {} at release", holder_id);
            }
        }
        drop(holder);
        self.released.notify_waiters();
    }
}

/// Proof of holding the operation lock.
#[derive(Debug)]
pub struct OperationPermit {
    lock: Arc<OperationLock>,
    operation: Operation,
    holder_id: Uuid,
}

impl OperationPermit {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl Drop for OperationPermit {
    fn drop(&mut self) {
        self.lock.release(self.holder_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_release() {
        let lock = OperationLock::new();

        let permit = lock.try_acquire(Operation::Save).unwrap();
        assert_eq!(permit.operation(), Operation::Save);
        assert_eq!(lock.running(), Some(Operation::Save));

        // Anything else is refused while held
        assert_eq!(lock.try_acquire(Operation::Open).unwrap_err(), Operation::Save);
        assert_eq!(lock.try_acquire(Operation::Autosave).unwrap_err(), Operation::Save);

        drop(permit);
        assert_eq!(lock.running(), None);
        assert!(lock.try_acquire(Operation::Open).is_ok());
    }

    #[tokio::test]
    async fn test_user_operation_rejected_as_busy() {
        let lock = OperationLock::new();
        let _export = lock.acquire(Operation::ExportPdf).await.unwrap();

        let err = lock.acquire(Operation::Save).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Busy {
                requested: Operation::Save,
                running: Operation::ExportPdf,
            }
        );
        assert!(err.to_string().contains("export to PDF"));
    }

    #[tokio::test]
    async fn test_user_operation_waits_for_autosave() {
        let lock = OperationLock::new();
        let autosave = lock.try_acquire(Operation::Autosave).unwrap();

        let waiter = {
            let lock = Arc::clone(&lock);
            tokio::spawn(async move { lock.acquire(Operation::Save).await.map(|p| p.operation()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(autosave);
        let acquired = waiter.await.unwrap().unwrap();
        assert_eq!(acquired, Operation::Save);
        assert_eq!(lock.running(), None);
    }

    #[tokio::test]
    async fn test_stale_release_is_ignored() {
        let lock = OperationLock::new();
        let permit = lock.try_acquire(Operation::New).unwrap();

        lock.release(Uuid::new_v4());
        assert_eq!(lock.running(), Some(Operation::New));

        drop(permit);
        assert_eq!(lock.running(), None);
    }
}
