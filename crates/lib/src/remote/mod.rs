//! Remote store implementations for Objectbase
//!
//! This module provides the core `RemoteStore` trait and the backends that ship with the crate.
//!
//! The `RemoteStore` trait is the only thing the record engine knows about the backing store:
//! it fetches rows, inserts them, and performs single-field updates and deletes keyed by id.
//! Filtering, authentication and transport live entirely inside the implementations.

use std::any::Any;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::constants::ID_FIELD;
use crate::record::{Content, RecordId};

mod errors;
pub use errors::RemoteError;

mod in_memory;
pub use in_memory::InMemoryRemote;

#[cfg(feature = "postgrest")]
mod postgrest;
#[cfg(feature = "postgrest")]
pub use postgrest::PostgrestRemote;

/// Remote store trait abstracting the backend that holds the authoritative rows.
///
/// Every method is one asynchronous round-trip. Failures are reported through the returned
/// `Result` and must never panic, so the record engine can always settle the operation it is
/// tracking.
///
/// All implementations must be `Send` and `Sync` to allow sharing across tasks,
/// and implement `Any` to allow for downcasting if needed.
#[async_trait]
pub trait RemoteStore: Send + Sync + Any {
    /// Fetches every row of a table.
    async fn select_all(&self, table: &str) -> Result<Vec<Content>>;

    /// Fetches the row with the given id.
    ///
    /// # Returns
    /// The row's content, or a `RemoteError::RecordNotFound` if no such row exists.
    async fn select_by_id(&self, table: &str, id: &RecordId) -> Result<Content>;

    /// Fetches every row whose `field` equals `value`.
    async fn select_by_field(&self, table: &str, field: &str, value: &Value)
    -> Result<Vec<Content>>;

    /// Inserts a row and returns it as stored, including the id assigned by the backend.
    async fn insert(&self, table: &str, content: Content) -> Result<Content>;

    /// Sets a single field of the row with the given id.
    ///
    /// Updating a row that does not exist is an error (`RemoteError::RecordNotFound`).
    async fn update_field(&self, table: &str, id: &RecordId, field: &str, value: Value)
    -> Result<()>;

    /// Deletes the row with the given id.
    ///
    /// Deleting a row that does not exist is an error (`RemoteError::RecordNotFound`).
    async fn delete(&self, table: &str, id: &RecordId) -> Result<()>;

    /// Name of the column that identifies rows.
    ///
    /// Tables read record ids from this column, so it must match the column the store keys
    /// updates and deletes on.
    fn id_field(&self) -> &str {
        ID_FIELD
    }

    /// Returns a reference to the store as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}
