//! Observer hooks for record lifecycle events.
//!
//! Observers are purely informational. They are invoked after the record's internal lock has
//! been released and nothing they do can change how an operation settles.

use std::sync::Arc;

use super::{OperationId, OperationKind, OperationOutcome, RecordError, RecordId};

/// Something that happened to a record.
#[derive(Debug, Clone)]
pub enum RecordEvent {
    /// A mutation was tracked and handed to the remote store.
    OperationIssued {
        table: String,
        record_id: RecordId,
        operation: OperationId,
        kind: OperationKind,
    },
    /// A mutation was refused locally and settled as a failure without a remote call.
    OperationRejected {
        table: String,
        record_id: RecordId,
        operation: OperationId,
        kind: OperationKind,
        error: RecordError,
    },
    /// A tracked mutation settled.
    OperationSettled {
        table: String,
        record_id: RecordId,
        outcome: OperationOutcome,
    },
    /// The last outstanding operation settled and the record is readable again.
    Quiescent { table: String, record_id: RecordId },
    /// A delete succeeded. The record is now terminal.
    Deleted { table: String, record_id: RecordId },
}

impl RecordEvent {
    pub fn record_id(&self) -> &RecordId {
        match self {
            RecordEvent::OperationIssued { record_id, .. }
            | RecordEvent::OperationRejected { record_id, .. }
            | RecordEvent::OperationSettled { record_id, .. }
            | RecordEvent::Quiescent { record_id, .. }
            | RecordEvent::Deleted { record_id, .. } => record_id,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            RecordEvent::OperationIssued { table, .. }
            | RecordEvent::OperationRejected { table, .. }
            | RecordEvent::OperationSettled { table, .. }
            | RecordEvent::Quiescent { table, .. }
            | RecordEvent::Deleted { table, .. } => table,
        }
    }

    /// Stable event name, convenient for log fields and assertions.
    pub fn name(&self) -> &'static str {
        match self {
            RecordEvent::OperationIssued { .. } => "operation_issued",
            RecordEvent::OperationRejected { .. } => "operation_rejected",
            RecordEvent::OperationSettled { .. } => "operation_settled",
            RecordEvent::Quiescent { .. } => "quiescent",
            RecordEvent::Deleted { .. } => "deleted",
        }
    }
}

/// Trait for receiving record events.
///
/// Any `Fn(&RecordEvent) + Send + Sync` closure is an observer.
pub trait RecordObserver: Send + Sync {
    fn on_event(&self, event: &RecordEvent);
}

impl<F> RecordObserver for F
where
    F: Fn(&RecordEvent) + Send + Sync,
{
    fn on_event(&self, event: &RecordEvent) {
        self(event)
    }
}

/// A collection of observers notified together, in registration order.
#[derive(Default, Clone)]
pub struct ObserverCollection {
    observers: Vec<Arc<dyn RecordObserver>>,
}

impl ObserverCollection {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn RecordObserver>) {
        self.observers.push(observer);
    }

    pub fn notify(&self, event: &RecordEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for ObserverCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverCollection")
            .field("observers", &self.observers.len())
            .finish()
    }
}
