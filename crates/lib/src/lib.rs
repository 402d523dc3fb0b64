//!
//! Objectbase: records over a remote table store that can be written without waiting.
//!
//! Every field write to a record is its own round-trip to the backing store. This crate lets
//! a caller fire several writes back-to-back, refuses to serve possibly-stale reads while any
//! of them is outstanding, and offers a barrier (`sync`) that resolves once the record has
//! quiesced.
//!
//! ## Core Concepts
//!
//! * **Remote stores (`remote::RemoteStore`)**: The pluggable backend that fetches rows and
//!   performs single-field updates and deletes. `InMemoryRemote` and `PostgrestRemote` ship
//!   with the crate.
//! * **Tables (`table::Table`)**: A named collection within a remote store. Tables fetch and
//!   insert rows and produce `Record` handles from them.
//! * **Records (`record::Record`)**: The unit of synchronization. A record mirrors a row's
//!   content locally, tracks its in-flight operations and moves between the
//!   `Quiescent`, `Busy` and `Deleted` states.
//! * **Pending operations (`record::PendingOperation`)**: A single tracked mutation with a
//!   settle-once outcome.
//! * **Accessors (`accessor::RecordAccessor`)**: The read/write/sync field contract layered
//!   on top of a record.

pub mod accessor;
pub mod config;
pub mod constants;
pub mod record;
pub mod remote;
pub mod table;

pub use accessor::{FieldRead, RecordAccessor};
pub use config::{DeletedSyncPolicy, RecordConfig};
pub use record::{
    Content, LockState, ObserverCollection, OperationId, OperationKind, OperationOutcome,
    PendingOperation, Record, RecordError, RecordEvent, RecordId, RecordObserver, SyncFailure,
    SyncReport,
};
pub use remote::{InMemoryRemote, RemoteError, RemoteStore};
pub use table::Table;

#[cfg(feature = "postgrest")]
pub use remote::PostgrestRemote;

/// Result type used throughout the Objectbase library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Objectbase library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured errors from the remote store layer
    #[error(transparent)]
    Remote(remote::RemoteError),

    /// Structured errors from the record engine
    #[error(transparent)]
    Record(record::RecordError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Remote(_) => "remote",
            Error::Record(_) => "record",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Remote(remote_err) => remote_err.is_not_found(),
            Error::Record(record_err) => record_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a timeout.
    pub fn is_timeout_error(&self) -> bool {
        match self {
            Error::Record(record_err) => record_err.is_timeout(),
            _ => false,
        }
    }

    /// Check if this error came from the remote store.
    pub fn is_remote_error(&self) -> bool {
        matches!(self, Error::Remote(_))
    }

    /// Check if this error was caused by touching a deleted record.
    pub fn is_deleted_error(&self) -> bool {
        match self {
            Error::Record(record_err) => record_err.is_deleted(),
            _ => false,
        }
    }

    /// Check if this error was a read refused because the record is not settled.
    pub fn is_busy_error(&self) -> bool {
        match self {
            Error::Record(record_err) => record_err.is_busy(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Remote(remote_err) => remote_err.is_transport_error(),
            _ => false,
        }
    }
}
