//! Bookkeeping for the operations tracked by one record.
//!
//! Quiescence is decided by a counter rather than by scanning the tracked operations:
//! issuing increments it, settling decrements it, and the settlement that brings it to zero
//! is the one that ends the busy period. Both sides run under the owning record's lock, so
//! an operation issued while another is settling is always counted.

use std::collections::HashSet;

use super::{OperationId, OperationKind, PendingOperation, RecordId};

#[derive(Debug, Default)]
pub(crate) struct OperationSet {
    /// Operations issued since the record was last quiescent, in issue order
    operations: Vec<PendingOperation>,
    /// Tracked operations that have not settled yet
    outstanding: usize,
    next_id: u64,
}

impl OperationSet {
    /// Allocates an operation id without tracking anything.
    pub(crate) fn next_id(&mut self) -> OperationId {
        self.next_id += 1;
        OperationId::new(self.next_id)
    }

    /// Creates a new operation and starts tracking it.
    pub(crate) fn issue(&mut self, record_id: RecordId, kind: OperationKind) -> PendingOperation {
        let id = self.next_id();
        let operation = PendingOperation::new(id, record_id, kind);
        self.operations.push(operation.clone());
        self.outstanding += 1;
        operation
    }

    /// Records that one tracked operation settled.
    ///
    /// Returns `true` when this was the last outstanding operation.
    pub(crate) fn mark_settled(&mut self) -> bool {
        debug_assert!(self.outstanding > 0, "settled more operations than issued");
        self.outstanding = self.outstanding.saturating_sub(1);
        self.outstanding == 0
    }

    pub(crate) fn all_settled(&self) -> bool {
        self.outstanding == 0
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub(crate) fn len(&self) -> usize {
        self.operations.len()
    }

    /// Forgets every tracked operation. Only valid once all of them have settled.
    pub(crate) fn clear(&mut self) {
        debug_assert!(self.all_settled());
        self.operations.clear();
    }

    /// Tracked operations whose ids are not in `seen`, in issue order.
    pub(crate) fn unseen(&self, seen: &HashSet<OperationId>) -> Vec<PendingOperation> {
        self.operations
            .iter()
            .filter(|operation| !seen.contains(&operation.id()))
            .cloned()
            .collect()
    }
}
