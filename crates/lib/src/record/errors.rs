//! Error types for the record engine.

use thiserror::Error;

use super::RecordId;
use crate::remote::RemoteError;

/// Errors raised by records, their operations and the accessor layer.
///
/// Mutation failures are never returned from the mutation call itself. They are stored as
/// the settled outcome of the operation and surface through
/// [`PendingOperation::outcome`](super::PendingOperation::outcome) or the
/// [`SyncReport`](super::SyncReport) returned by `sync`. The type is `Clone` for that reason.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    /// The backend rejected an update or delete, or could not be reached.
    #[error("Remote {operation} failed for record {record_id}")]
    RemoteMutationFailed {
        record_id: RecordId,
        /// Short description of the operation, e.g. `update 'name'`
        operation: String,
        #[source]
        source: RemoteError,
    },

    /// A mutation was attempted after the record was deleted.
    #[error("Record {record_id} is deleted")]
    MutationOnDeletedRecord { record_id: RecordId },

    /// A single operation did not settle within the configured timeout.
    #[error("Operation on record {record_id} timed out after {timeout_ms}ms")]
    OperationTimeout { record_id: RecordId, timeout_ms: u64 },

    /// `sync` gave up before the record quiesced.
    #[error("Record {record_id} still had {outstanding} outstanding operation(s) at sync timeout")]
    SyncTimeout {
        record_id: RecordId,
        outstanding: usize,
    },

    /// A read was refused because operations are still outstanding.
    #[error("Record {record_id} is busy; sync before reading")]
    RecordBusy { record_id: RecordId },

    /// A read was refused because the record has been deleted.
    #[error("Record {record_id} has been deleted")]
    RecordDeleted { record_id: RecordId },

    /// The field does not exist in the record's content.
    #[error("Field '{field}' not found in record {record_id}")]
    FieldNotFound { record_id: RecordId, field: String },

    /// A value could not be converted to or from the field's JSON representation.
    #[error("Invalid value for field '{field}' of record {record_id}: {reason}")]
    InvalidFieldValue {
        record_id: RecordId,
        field: String,
        reason: String,
    },

    /// Fetched data does not carry a usable id.
    #[error("Row from table '{table}' has no usable '{field}' column")]
    MissingId { table: String, field: String },

    /// The operation could not be scheduled because no async runtime is running.
    #[error("No async runtime available to run operation on record {record_id}")]
    RuntimeUnavailable { record_id: RecordId },

    /// The task driving an operation ended without settling it.
    #[error("Operation on record {record_id} was abandoned before settling")]
    OperationAbandoned { record_id: RecordId },
}

impl RecordError {
    /// Check if this error indicates a field or row was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            RecordError::FieldNotFound { .. } => true,
            RecordError::RemoteMutationFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is a timeout, either per-operation or at the barrier.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            RecordError::OperationTimeout { .. } | RecordError::SyncTimeout { .. }
        )
    }

    /// Check if this error was caused by the record being deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(
            self,
            RecordError::MutationOnDeletedRecord { .. } | RecordError::RecordDeleted { .. }
        )
    }

    /// Check if this error is a read refused while operations were outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, RecordError::RecordBusy { .. })
    }

    /// Check if the backend was contacted and the mutation failed there.
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, RecordError::RemoteMutationFailed { .. })
    }

    /// Get the record id this error is about, if any.
    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            RecordError::RemoteMutationFailed { record_id, .. }
            | RecordError::MutationOnDeletedRecord { record_id }
            | RecordError::OperationTimeout { record_id, .. }
            | RecordError::SyncTimeout { record_id, .. }
            | RecordError::RecordBusy { record_id }
            | RecordError::RecordDeleted { record_id }
            | RecordError::FieldNotFound { record_id, .. }
            | RecordError::InvalidFieldValue { record_id, .. }
            | RecordError::RuntimeUnavailable { record_id }
            | RecordError::OperationAbandoned { record_id } => Some(record_id),
            RecordError::MissingId { .. } => None,
        }
    }
}

// Conversion from RecordError to the main Error type
impl From<RecordError> for crate::Error {
    fn from(err: RecordError) -> Self {
        crate::Error::Record(err)
    }
}
