//! Field-level access to a record.
//!
//! `RecordAccessor` is the read/write/sync contract callers use instead of touching record
//! content directly. It wraps a [`Record`] and adds:
//!
//! - gated reads that refuse while writes are outstanding,
//! - explicit stale reads for callers that prefer a possibly-outdated value over an error,
//! - typed reads and writes through serde,
//! - local validation that refuses writes to unknown fields or the id column without
//!   touching the remote store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;
use crate::record::{LockState, OperationKind, PendingOperation, Record, RecordError, SyncReport};

/// The value of a field together with whether it can be trusted.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRead {
    /// The record is quiescent; this is the last known-good value.
    Fresh(Value),
    /// Operations are outstanding or the record is deleted; the value may be outdated.
    Stale(Value),
}

impl FieldRead {
    pub fn value(&self) -> &Value {
        match self {
            FieldRead::Fresh(v) | FieldRead::Stale(v) => v,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            FieldRead::Fresh(v) | FieldRead::Stale(v) => v,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, FieldRead::Stale(_))
    }
}

/// Read/write/sync access to the fields of one record.
#[derive(Clone, Debug)]
pub struct RecordAccessor {
    record: Record,
}

impl RecordAccessor {
    pub fn new(record: Record) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Names of the fields currently present in the record.
    pub fn fields(&self) -> Vec<String> {
        self.record.view(|_, content| content.keys().cloned().collect())
    }

    /// Reads a field.
    ///
    /// # Errors
    /// * `RecordBusy` while any operation on the record is outstanding
    /// * `RecordDeleted` once the record has been deleted
    /// * `FieldNotFound` if the field does not exist
    pub fn read(&self, field: &str) -> Result<Value> {
        let record_id = self.record.id().clone();
        self.record.view(|lock, content| match lock {
            LockState::Busy => Err(RecordError::RecordBusy { record_id }.into()),
            LockState::Deleted => Err(RecordError::RecordDeleted { record_id }.into()),
            LockState::Quiescent => content.get(field).cloned().ok_or_else(|| {
                RecordError::FieldNotFound {
                    record_id,
                    field: field.to_string(),
                }
                .into()
            }),
        })
    }

    /// Reads a field without the gate, marking the value stale when it cannot be trusted.
    ///
    /// Returns `None` if the field does not exist.
    pub fn peek(&self, field: &str) -> Option<FieldRead> {
        self.record.view(|lock, content| {
            let value = content.get(field).cloned()?;
            Some(match lock {
                LockState::Quiescent => FieldRead::Fresh(value),
                LockState::Busy | LockState::Deleted => FieldRead::Stale(value),
            })
        })
    }

    /// Reads a field and deserializes it.
    pub fn get<T: DeserializeOwned>(&self, field: &str) -> Result<T> {
        let value = self.read(field)?;
        serde_json::from_value(value).map_err(|e| {
            RecordError::InvalidFieldValue {
                record_id: self.record.id().clone(),
                field: field.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Deserializes the whole record, gated like [`read`](Self::read).
    pub fn snapshot<T: DeserializeOwned>(&self) -> Result<T> {
        let content = self.record.content()?;
        Ok(serde_json::from_value(Value::Object(content))?)
    }

    /// Writes a field. Fire-and-forget: the returned operation can be awaited or ignored.
    ///
    /// Writes to fields the record does not have, writes to the id column and values that
    /// cannot be serialized settle immediately as failures without contacting the remote
    /// store.
    pub fn write<T: Serialize>(&self, field: &str, value: T) -> PendingOperation {
        let record_id = self.record.id().clone();
        let id_field = self.record.id_field();

        let refusal = if field == id_field {
            Some(RecordError::InvalidFieldValue {
                record_id,
                field: field.to_string(),
                reason: "the id column is immutable".to_string(),
            })
        } else {
            self.record.view(|lock, content| {
                (lock != LockState::Deleted && !content.contains_key(field)).then(|| {
                    RecordError::FieldNotFound {
                        record_id,
                        field: field.to_string(),
                    }
                })
            })
        };

        let value = match (refusal, serde_json::to_value(value)) {
            (None, Ok(value)) => value,
            (Some(error), _) => return self.refuse(field, Value::Null, error),
            (None, Err(e)) => {
                let error = RecordError::InvalidFieldValue {
                    record_id: self.record.id().clone(),
                    field: field.to_string(),
                    reason: e.to_string(),
                };
                return self.refuse(field, Value::Null, error);
            }
        };
        self.record.update_field(field, value)
    }

    /// Waits for every outstanding write on the record.
    pub async fn sync(&self) -> SyncReport {
        self.record.sync().await
    }

    fn refuse(&self, field: &str, value: Value, error: RecordError) -> PendingOperation {
        self.record.refuse(
            OperationKind::UpdateField {
                field: field.to_string(),
                value,
            },
            error,
        )
    }
}
