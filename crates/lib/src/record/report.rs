//! The result of a `sync` barrier.

use super::{OperationId, OperationOutcome, RecordError};

/// A failed operation observed by `sync`.
#[derive(Debug, Clone)]
pub struct SyncFailure {
    pub operation: OperationId,
    /// The field the operation wrote, `None` for deletes
    pub field: Option<String>,
    pub error: RecordError,
}

/// Outcomes of every operation a `sync` call waited for, in issue order.
///
/// Failures are kept per operation instead of being folded into a single flag, so a caller
/// can tell which field failed and why.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    outcomes: Vec<OperationOutcome>,
    deleted: bool,
}

impl SyncReport {
    pub(crate) fn push(&mut self, outcome: OperationOutcome) {
        self.outcomes.push(outcome);
    }

    pub(crate) fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    pub fn outcomes(&self) -> &[OperationOutcome] {
        &self.outcomes
    }

    /// Every failed operation, with the field it targeted.
    pub fn failures(&self) -> Vec<SyncFailure> {
        self.outcomes
            .iter()
            .filter_map(|outcome| {
                outcome.error().map(|error| SyncFailure {
                    operation: outcome.operation,
                    field: outcome.field().map(str::to_string),
                    error: error.clone(),
                })
            })
            .collect()
    }

    /// Names of the fields whose updates failed.
    pub fn failed_fields(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.is_success())
            .filter_map(OperationOutcome::field)
            .collect()
    }

    /// True when every awaited operation succeeded.
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(OperationOutcome::is_success)
    }

    /// Whether the record was deleted when the barrier returned.
    pub fn record_deleted(&self) -> bool {
        self.deleted
    }

    /// Number of operations the barrier waited for.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
