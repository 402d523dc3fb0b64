//! Records: the write-barrier and read-gating engine.
//!
//! A `Record` mirrors one remote row. Each field update or delete becomes a
//! [`PendingOperation`] that is tracked before its remote call starts, so a `sync` issued
//! right after the call always sees it.
//!
//! ## States
//!
//! * `Quiescent`: nothing outstanding, content may be read.
//! * `Busy`: at least one tracked operation has not settled, reads are refused.
//! * `Deleted`: a delete succeeded. Terminal; further mutations settle as failures without
//!   contacting the remote store.
//!
//! ## Concurrent writes to one field
//!
//! Content is updated when an operation settles successfully, not when it is issued. Two
//! in-flight updates to the same field therefore resolve as last-settled-wins, which may
//! differ from issue order when the backend answers out of order. Writes to different fields
//! never interfere.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use handle_trait::Handle;
use serde_json::Value;
use tracing::{debug, warn};

use crate::Result;
use crate::accessor::RecordAccessor;
use crate::config::{DeletedSyncPolicy, RecordConfig};
use crate::remote::{RemoteError, RemoteStore};

mod errors;
mod events;
mod id;
mod operation;
mod operation_set;
mod report;

pub use errors::RecordError;
pub use events::{ObserverCollection, RecordEvent, RecordObserver};
pub use id::{Content, RecordId};
pub use operation::{OperationId, OperationKind, OperationOutcome, PendingOperation};
pub use report::{SyncFailure, SyncReport};

use operation_set::OperationSet;

/// Locks a mutex, recovering the data if a panicking thread poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lifecycle state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockState {
    Quiescent,
    Busy,
    Deleted,
}

/// A handle to one remote row.
///
/// `Record` is cheap to clone; clones share content, state and tracked operations. Mutation
/// methods return immediately with a [`PendingOperation`] and require a Tokio runtime to
/// drive the remote call.
///
/// # Example
///
/// ```
/// # use std::sync::Arc;
/// # use objectbase::{InMemoryRemote, Table};
/// # use serde_json::json;
/// # #[tokio::main]
/// # async fn main() -> objectbase::Result<()> {
/// let table = Table::new(Arc::new(InMemoryRemote::new()), "pets");
/// let mut row = serde_json::Map::new();
/// row.insert("name".to_string(), json!("Old"));
/// let record = table.insert(row).await?;
///
/// record.update_field("name", json!("Pip"));
/// record.update_field("breed", json!("Russian Dwarf"));
/// let report = record.sync().await;
///
/// assert!(report.is_clean());
/// assert!(record.ready_to_read());
/// assert_eq!(record.content()?["name"], json!("Pip"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Handle)]
pub struct Record {
    inner: Arc<RecordInner>,
}

struct RecordInner {
    id: RecordId,
    table: String,
    remote: Arc<dyn RemoteStore>,
    config: RecordConfig,
    observers: Arc<ObserverCollection>,
    state: Mutex<RecordState>,
}

#[derive(Debug)]
struct RecordState {
    content: Content,
    lock: LockState,
    operations: OperationSet,
}

impl fmt::Debug for RecordInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("table", &self.table)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Record {
    /// Builds a quiescent record around freshly fetched content.
    pub(crate) fn new(
        id: RecordId,
        table: String,
        content: Content,
        remote: Arc<dyn RemoteStore>,
        config: RecordConfig,
        observers: Arc<ObserverCollection>,
    ) -> Self {
        Self {
            inner: Arc::new(RecordInner {
                id,
                table,
                remote,
                config,
                observers,
                state: Mutex::new(RecordState {
                    content,
                    lock: LockState::Quiescent,
                    operations: OperationSet::default(),
                }),
            }),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.inner.id
    }

    /// Name of the table this record belongs to.
    pub fn table(&self) -> &str {
        &self.inner.table
    }

    pub fn config(&self) -> &RecordConfig {
        &self.inner.config
    }

    /// Name of the column holding the record's id.
    pub fn id_field(&self) -> &str {
        self.inner.remote.id_field()
    }

    pub fn lock_state(&self) -> LockState {
        self.state().lock
    }

    /// True when no operation is outstanding and the record is not deleted.
    pub fn ready_to_read(&self) -> bool {
        self.lock_state() == LockState::Quiescent
    }

    pub fn is_deleted(&self) -> bool {
        self.lock_state() == LockState::Deleted
    }

    /// Number of tracked operations that have not settled.
    pub fn outstanding(&self) -> usize {
        self.state().operations.outstanding()
    }

    /// Number of operations tracked since the record was last quiescent.
    pub fn tracked(&self) -> usize {
        self.state().operations.len()
    }

    /// The record's content, refused while the record is busy or deleted.
    pub fn content(&self) -> Result<Content> {
        let state = self.state();
        match state.lock {
            LockState::Quiescent => Ok(state.content.clone()),
            LockState::Busy => Err(RecordError::RecordBusy {
                record_id: self.inner.id.clone(),
            }
            .into()),
            LockState::Deleted => Err(RecordError::RecordDeleted {
                record_id: self.inner.id.clone(),
            }
            .into()),
        }
    }

    /// The local mirror as it is right now, whether or not operations are outstanding.
    ///
    /// The result may be stale while the record is busy.
    pub fn content_unchecked(&self) -> Content {
        self.state().content.clone()
    }

    /// Runs `f` against the lock state and content as one consistent view.
    pub(crate) fn view<R>(&self, f: impl FnOnce(LockState, &Content) -> R) -> R {
        let state = self.state();
        f(state.lock, &state.content)
    }

    /// Field-level accessor over this record.
    pub fn accessor(&self) -> RecordAccessor {
        RecordAccessor::new(self.handle())
    }

    /// Sets `field` to `value` on the remote row.
    ///
    /// Returns at once. The local content is updated only if the remote update succeeds; a
    /// failure leaves it untouched and is reported through the returned operation and `sync`.
    pub fn update_field(&self, field: impl Into<String>, value: Value) -> PendingOperation {
        self.issue(OperationKind::UpdateField {
            field: field.into(),
            value,
        })
    }

    /// Deletes the remote row.
    ///
    /// On success the record becomes `Deleted`. On failure it stays in its previous state and
    /// remains mutable. Deleting an already-deleted record settles at once as a
    /// `MutationOnDeletedRecord` failure.
    pub fn delete(&self) -> PendingOperation {
        self.issue(OperationKind::Delete)
    }

    /// Waits until every operation tracked on this record has settled.
    ///
    /// Operations issued while the barrier is waiting are picked up too: after each round the
    /// tracked set is checked again for operations the barrier has not seen, and `sync`
    /// only returns once there are none.
    ///
    /// On a deleted record the behavior follows [`RecordConfig::deleted_sync`].
    pub async fn sync(&self) -> SyncReport {
        let mut report = SyncReport::default();
        let mut seen = HashSet::new();
        loop {
            let pending = {
                let state = self.state();
                if state.lock == LockState::Deleted
                    && self.inner.config.deleted_sync == DeletedSyncPolicy::ReturnImmediately
                {
                    break;
                }
                state.operations.unseen(&seen)
            };
            if pending.is_empty() {
                break;
            }
            debug!(
                table = %self.inner.table,
                record_id = %self.inner.id,
                pending = pending.len(),
                "sync waiting for operations"
            );
            for operation in pending {
                seen.insert(operation.id());
                report.push(operation.wait().await);
            }
        }
        report.set_deleted(self.is_deleted());
        report
    }

    /// Like [`sync`](Self::sync), but gives up after `timeout`.
    ///
    /// # Errors
    /// `RecordError::SyncTimeout` if operations are still outstanding when the timeout expires.
    pub async fn sync_timeout(&self, timeout: Duration) -> Result<SyncReport> {
        match tokio::time::timeout(timeout, self.sync()).await {
            Ok(report) => Ok(report),
            Err(_) => Err(RecordError::SyncTimeout {
                record_id: self.inner.id.clone(),
                outstanding: self.outstanding(),
            }
            .into()),
        }
    }

    fn state(&self) -> MutexGuard<'_, RecordState> {
        lock(&self.inner.state)
    }

    fn issue(&self, kind: OperationKind) -> PendingOperation {
        let issued = {
            let mut state = self.state();
            if state.lock == LockState::Deleted {
                Err(state.operations.next_id())
            } else {
                let operation = state.operations.issue(self.inner.id.clone(), kind.clone());
                state.lock = LockState::Busy;
                Ok(operation)
            }
        };

        let operation = match issued {
            Ok(operation) => operation,
            Err(operation_id) => {
                let error = RecordError::MutationOnDeletedRecord {
                    record_id: self.inner.id.clone(),
                };
                return self.reject(operation_id, kind, error);
            }
        };

        debug!(
            table = %self.inner.table,
            record_id = %self.inner.id,
            operation = %operation.id(),
            "issuing {}",
            kind.describe()
        );
        self.emit(RecordEvent::OperationIssued {
            table: self.inner.table.clone(),
            record_id: self.inner.id.clone(),
            operation: operation.id(),
            kind,
        });

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let guard = AbandonGuard {
                    record: self.handle(),
                    operation: operation.clone(),
                };
                runtime.spawn(async move {
                    let result = guard.record.perform(guard.operation.kind()).await;
                    guard.record.settle(&guard.operation, result);
                });
            }
            Err(_) => {
                warn!(
                    record_id = %self.inner.id,
                    "no Tokio runtime; failing operation {}",
                    operation.id()
                );
                self.settle(
                    &operation,
                    Err(RecordError::RuntimeUnavailable {
                        record_id: self.inner.id.clone(),
                    }),
                );
            }
        }
        operation
    }

    /// Refuses a mutation before it reaches the remote store.
    ///
    /// The returned operation is already settled with `error` and is never tracked, so it
    /// does not make the record busy.
    pub(crate) fn refuse(&self, kind: OperationKind, error: RecordError) -> PendingOperation {
        let operation_id = self.state().operations.next_id();
        self.reject(operation_id, kind, error)
    }

    fn reject(
        &self,
        operation_id: OperationId,
        kind: OperationKind,
        error: RecordError,
    ) -> PendingOperation {
        warn!(
            table = %self.inner.table,
            record_id = %self.inner.id,
            "rejecting {}: {error}",
            kind.describe()
        );
        self.emit(RecordEvent::OperationRejected {
            table: self.inner.table.clone(),
            record_id: self.inner.id.clone(),
            operation: operation_id,
            kind: kind.clone(),
            error: error.clone(),
        });
        PendingOperation::rejected(operation_id, self.inner.id.clone(), kind, error)
    }

    /// Performs the remote call for one operation, bounded by the configured timeout.
    async fn perform(&self, kind: &OperationKind) -> std::result::Result<(), RecordError> {
        let remote = &self.inner.remote;
        let table = self.inner.table.as_str();
        let id = &self.inner.id;
        let call = async {
            match kind {
                OperationKind::UpdateField { field, value } => {
                    remote.update_field(table, id, field, value.clone()).await
                }
                OperationKind::Delete => remote.delete(table, id).await,
            }
        };

        let result = match self.inner.config.operation_timeout() {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(RecordError::OperationTimeout {
                        record_id: id.clone(),
                        timeout_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => call.await,
        };

        result.map_err(|err| match err {
            crate::Error::Remote(source) => RecordError::RemoteMutationFailed {
                record_id: id.clone(),
                operation: kind.describe(),
                source,
            },
            crate::Error::Record(record_err) => record_err,
            other => RecordError::RemoteMutationFailed {
                record_id: id.clone(),
                operation: kind.describe(),
                source: RemoteError::Transport {
                    table: table.to_string(),
                    reason: other.to_string(),
                },
            },
        })
    }

    /// Records the outcome of a tracked operation and re-evaluates the lock state.
    ///
    /// Content, the outstanding counter, the lock state and the operation's outcome all change
    /// under one acquisition of the record lock.
    fn settle(&self, operation: &PendingOperation, result: std::result::Result<(), RecordError>) {
        let mut became_deleted = false;
        let mut became_quiescent = false;
        let settlement = {
            let mut state = self.state();
            let Some(settlement) = operation.resolve(result) else {
                return;
            };
            if settlement.outcome.is_success() {
                match operation.kind() {
                    OperationKind::UpdateField { field, value } => {
                        state.content.insert(field.clone(), value.clone());
                    }
                    OperationKind::Delete => {
                        if state.lock != LockState::Deleted {
                            state.lock = LockState::Deleted;
                            became_deleted = true;
                        }
                    }
                }
            }
            if state.operations.mark_settled() {
                state.operations.clear();
                if state.lock == LockState::Busy {
                    state.lock = LockState::Quiescent;
                    became_quiescent = true;
                }
            }
            settlement
        };

        match settlement.outcome.error() {
            None => debug!(
                table = %self.inner.table,
                record_id = %self.inner.id,
                operation = %operation.id(),
                "settled {}",
                operation.kind().describe()
            ),
            Some(err) => warn!(
                table = %self.inner.table,
                record_id = %self.inner.id,
                operation = %operation.id(),
                "{} failed: {err}",
                operation.kind().describe()
            ),
        }

        let outcome = settlement.outcome.clone();
        settlement.fire();
        self.emit(RecordEvent::OperationSettled {
            table: self.inner.table.clone(),
            record_id: self.inner.id.clone(),
            outcome,
        });
        if became_deleted {
            debug!(record_id = %self.inner.id, "record deleted");
            self.emit(RecordEvent::Deleted {
                table: self.inner.table.clone(),
                record_id: self.inner.id.clone(),
            });
        }
        if became_quiescent {
            debug!(record_id = %self.inner.id, "record quiescent");
            self.emit(RecordEvent::Quiescent {
                table: self.inner.table.clone(),
                record_id: self.inner.id.clone(),
            });
        }
    }

    fn emit(&self, event: RecordEvent) {
        self.inner.observers.notify(&event);
    }
}

/// Settles an operation as abandoned if the task driving it is dropped first.
///
/// A task is dropped without finishing when the remote store panics or the runtime shuts
/// down mid-call.
struct AbandonGuard {
    record: Record,
    operation: PendingOperation,
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if self.operation.is_settled() {
            return;
        }
        let error = RecordError::OperationAbandoned {
            record_id: self.record.inner.id.clone(),
        };
        self.record.settle(&self.operation, Err(error));
    }
}
