//! Error types for remote store operations.

use thiserror::Error;

use crate::record::RecordId;

/// Errors reported by a [`RemoteStore`](super::RemoteStore).
///
/// Remote failures are always returned as values. The record engine turns them into settled
/// failure outcomes, so a backend error never escapes a mutation call synchronously.
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// No row with the given id exists in the table.
    #[error("Record {id} not found in table '{table}'")]
    RecordNotFound { table: String, id: RecordId },

    /// The backend understood the request and refused it.
    #[error("Remote rejected request on '{table}' (status {status}): {message}")]
    Rejected {
        table: String,
        status: u16,
        /// Backend-specific error code, when one was returned
        code: Option<String>,
        message: String,
    },

    /// The request never produced a response.
    #[error("Transport failure talking to '{table}': {reason}")]
    Transport { table: String, reason: String },

    /// The backend answered with something that could not be interpreted.
    #[error("Invalid response from '{table}': {reason}")]
    InvalidResponse { table: String, reason: String },

    /// The configured endpoint is not a usable base URL.
    #[error("Invalid remote URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl RemoteError {
    /// Check if this error indicates a row was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::RecordNotFound { .. })
    }

    /// Check if the backend rejected the request.
    pub fn is_rejected(&self) -> bool {
        matches!(self, RemoteError::Rejected { .. })
    }

    /// Check if this error is a transport-level failure.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, RemoteError::Transport { .. })
    }

    /// Get the table name associated with this error.
    pub fn table(&self) -> Option<&str> {
        match self {
            RemoteError::RecordNotFound { table, .. }
            | RemoteError::Rejected { table, .. }
            | RemoteError::Transport { table, .. }
            | RemoteError::InvalidResponse { table, .. } => Some(table),
            RemoteError::InvalidUrl { .. } => None,
        }
    }
}

// Conversion from RemoteError to the main Error type
impl From<RemoteError> for crate::Error {
    fn from(err: RemoteError) -> Self {
        crate::Error::Remote(err)
    }
}
