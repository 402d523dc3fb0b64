//! Configuration for the record engine.
//!
//! A [`RecordConfig`] is attached to a [`Table`](crate::Table) and copied into every
//! [`Record`](crate::Record) the table produces.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How `sync` behaves once a record has been deleted.
///
/// Deletion is terminal: a deleted record never returns to `Quiescent`. This policy only
/// decides whether the barrier still waits for operations that were already in flight when
/// the deletion landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeletedSyncPolicy {
    /// Wait for operations that were in flight at deletion time, then return.
    #[default]
    DrainOutstanding,
    /// Return at once with an empty report.
    ReturnImmediately,
}

/// Settings shared by every record of a table.
///
/// # Example
///
/// ```
/// use objectbase::{DeletedSyncPolicy, RecordConfig};
///
/// let config = RecordConfig {
///     operation_timeout_ms: Some(5_000),
///     deleted_sync: DeletedSyncPolicy::ReturnImmediately,
///     ..Default::default()
/// };
/// assert_eq!(config.operation_timeout().map(|t| t.as_secs()), Some(5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Upper bound for a single remote mutation, in milliseconds.
    ///
    /// An operation that exceeds it settles as a failure, so `sync` always terminates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_timeout_ms: Option<u64>,

    /// Barrier behavior for deleted records.
    #[serde(default)]
    pub deleted_sync: DeletedSyncPolicy,
}

impl RecordConfig {
    /// The per-operation timeout, if one is configured.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    /// Returns a copy of this config with the given per-operation timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }
}
