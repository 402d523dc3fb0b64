//! Pending operations: one tracked mutation with a settle-once outcome.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::watch;

use super::{RecordError, RecordId, lock};

/// Identifier of an operation, unique within its record and increasing in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    pub(crate) fn new(n: u64) -> Self {
        Self(n)
    }

    /// The numeric value of this id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// What a pending operation does to its record.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    /// Set a single field to a new value.
    UpdateField { field: String, value: Value },
    /// Delete the whole record.
    Delete,
}

impl OperationKind {
    /// The field this operation writes, if it is a field update.
    pub fn field(&self) -> Option<&str> {
        match self {
            OperationKind::UpdateField { field, .. } => Some(field),
            OperationKind::Delete => None,
        }
    }

    /// Short human-readable description used in logs and errors.
    pub fn describe(&self) -> String {
        match self {
            OperationKind::UpdateField { field, .. } => format!("update '{field}'"),
            OperationKind::Delete => "delete".to_string(),
        }
    }
}

/// The terminal result of an operation.
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    pub operation: OperationId,
    pub kind: OperationKind,
    pub result: std::result::Result<(), RecordError>,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&RecordError> {
        self.result.as_ref().err()
    }

    pub fn field(&self) -> Option<&str> {
        self.kind.field()
    }
}

type Continuation = Box<dyn FnOnce(&OperationOutcome) + Send>;

/// A single in-flight mutation.
///
/// `PendingOperation` is a cheap-to-clone handle. All clones observe the same outcome, which
/// is written exactly once when the underlying remote call completes, fails, times out or is
/// rejected locally.
#[derive(Clone)]
pub struct PendingOperation {
    inner: Arc<OperationInner>,
}

struct OperationInner {
    id: OperationId,
    record_id: RecordId,
    kind: OperationKind,
    outcome: watch::Sender<Option<OperationOutcome>>,
    continuations: Mutex<Vec<Continuation>>,
}

/// An outcome that was just written, together with the continuations still to run.
///
/// The engine resolves operations while holding the record lock and fires continuations
/// after releasing it.
pub(crate) struct Settlement {
    pub(crate) outcome: OperationOutcome,
    continuations: Vec<Continuation>,
}

impl Settlement {
    pub(crate) fn fire(self) {
        for continuation in self.continuations {
            continuation(&self.outcome);
        }
    }
}

impl PendingOperation {
    pub(crate) fn new(id: OperationId, record_id: RecordId, kind: OperationKind) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            inner: Arc::new(OperationInner {
                id,
                record_id,
                kind,
                outcome,
                continuations: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Creates an operation that is already settled as a failure.
    ///
    /// Used for mutations refused before any remote call is made.
    pub(crate) fn rejected(
        id: OperationId,
        record_id: RecordId,
        kind: OperationKind,
        error: RecordError,
    ) -> Self {
        let operation = Self::new(id, record_id, kind);
        if let Some(settlement) = operation.resolve(Err(error)) {
            settlement.fire();
        }
        operation
    }

    pub fn id(&self) -> OperationId {
        self.inner.id
    }

    pub fn record_id(&self) -> &RecordId {
        &self.inner.record_id
    }

    pub fn kind(&self) -> &OperationKind {
        &self.inner.kind
    }

    /// Non-blocking check whether the operation has settled.
    pub fn is_settled(&self) -> bool {
        self.inner.outcome.borrow().is_some()
    }

    /// The outcome, once settled.
    pub fn outcome(&self) -> Option<OperationOutcome> {
        self.inner.outcome.borrow().clone()
    }

    /// Waits until the operation settles and returns its outcome.
    pub async fn wait(&self) -> OperationOutcome {
        let mut rx = self.inner.outcome.subscribe();
        if let Ok(slot) = rx.wait_for(Option::is_some).await
            && let Some(outcome) = slot.as_ref()
        {
            return outcome.clone();
        }
        OperationOutcome {
            operation: self.inner.id,
            kind: self.inner.kind.clone(),
            result: Err(RecordError::OperationAbandoned {
                record_id: self.inner.record_id.clone(),
            }),
        }
    }

    /// Registers a continuation that runs exactly once, after the operation settles.
    ///
    /// If the operation has already settled the continuation runs immediately on the
    /// calling thread. Otherwise it runs on whichever task settles the operation.
    pub fn on_settled<F>(&self, continuation: F)
    where
        F: FnOnce(&OperationOutcome) + Send + 'static,
    {
        let mut continuations = lock(&self.inner.continuations);
        let settled = self.inner.outcome.borrow().clone();
        match settled {
            Some(outcome) => {
                drop(continuations);
                continuation(&outcome);
            }
            None => continuations.push(Box::new(continuation)),
        }
    }

    /// Writes the outcome if none has been written yet.
    ///
    /// Returns `None` when the operation was already settled.
    pub(crate) fn resolve(
        &self,
        result: std::result::Result<(), RecordError>,
    ) -> Option<Settlement> {
        let mut continuations = lock(&self.inner.continuations);
        let outcome = OperationOutcome {
            operation: self.inner.id,
            kind: self.inner.kind.clone(),
            result,
        };
        let fresh = self.inner.outcome.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome.clone());
            true
        });
        if !fresh {
            return None;
        }
        Some(Settlement {
            outcome,
            continuations: std::mem::take(&mut *continuations),
        })
    }
}

impl fmt::Debug for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOperation")
            .field("id", &self.inner.id)
            .field("record_id", &self.inner.record_id)
            .field("kind", &self.inner.kind)
            .field("settled", &self.is_settled())
            .finish()
    }
}
