//! Tables: named collections in a remote store that produce records.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::Result;
use crate::config::RecordConfig;
use crate::constants::TABLE_DISPLAY_PREFIX;
use crate::record::{Content, ObserverCollection, Record, RecordError, RecordId, RecordObserver};
use crate::remote::RemoteStore;

/// A named table in a remote store.
///
/// Every record a table hands out shares the table's remote store, [`RecordConfig`] and
/// observers. Cloning a table is cheap.
///
/// # Example
///
/// ```
/// # use std::sync::Arc;
/// # use objectbase::{InMemoryRemote, Table};
/// # use serde_json::json;
/// # #[tokio::main]
/// # async fn main() -> objectbase::Result<()> {
/// let table = Table::new(Arc::new(InMemoryRemote::new()), "pets");
/// let mut row = serde_json::Map::new();
/// row.insert("name".to_string(), json!("Rex"));
/// let rex = table.insert(row).await?;
///
/// let found = table.select_by_id(rex.id().clone()).await?;
/// assert_eq!(found.content()?["name"], json!("Rex"));
/// assert_eq!(table.to_string(), "Objectbase table: pets");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Table {
    name: String,
    remote: Arc<dyn RemoteStore>,
    config: RecordConfig,
    observers: Arc<ObserverCollection>,
}

impl Table {
    pub fn new(remote: Arc<dyn RemoteStore>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote,
            config: RecordConfig::default(),
            observers: Arc::new(ObserverCollection::new()),
        }
    }

    /// Replaces the configuration applied to records produced from now on.
    pub fn with_config(mut self, config: RecordConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers an observer for records produced from now on.
    pub fn with_observer(mut self, observer: impl RecordObserver + 'static) -> Self {
        Arc::make_mut(&mut self.observers).add_observer(Arc::new(observer));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// Fetches every row of the table.
    pub async fn select_all(&self) -> Result<Vec<Record>> {
        let rows = self.remote.select_all(&self.name).await?;
        debug!(table = %self.name, rows = rows.len(), "selected all rows");
        rows.into_iter().map(|row| self.record_from(row)).collect()
    }

    /// Fetches one row by id.
    ///
    /// # Errors
    /// `RemoteError::RecordNotFound` if no row has that id.
    pub async fn select_by_id(&self, id: impl Into<RecordId>) -> Result<Record> {
        let id = id.into();
        let row = self.remote.select_by_id(&self.name, &id).await?;
        debug!(table = %self.name, %id, "selected row");
        self.record_from(row)
    }

    /// Fetches every row whose `field` equals `value`.
    pub async fn select_by_field(&self, field: &str, value: &Value) -> Result<Vec<Record>> {
        let rows = self.remote.select_by_field(&self.name, field, value).await?;
        debug!(table = %self.name, field, rows = rows.len(), "selected rows by field");
        rows.into_iter().map(|row| self.record_from(row)).collect()
    }

    /// Inserts a row and returns a record mirroring what the store wrote, including
    /// server-assigned columns such as the id.
    pub async fn insert(&self, content: Content) -> Result<Record> {
        let row = self.remote.insert(&self.name, content).await?;
        let record = self.record_from(row)?;
        info!(table = %self.name, id = %record.id(), "inserted record");
        Ok(record)
    }

    /// Wraps a fetched row in a quiescent record without contacting the store.
    ///
    /// The id is read from the store's [`id_field`](RemoteStore::id_field).
    ///
    /// # Errors
    /// `RecordError::MissingId` if the row has no usable value in the id column.
    pub fn record_from(&self, content: Content) -> Result<Record> {
        let id_field = self.remote.id_field();
        let id = content
            .get(id_field)
            .and_then(RecordId::from_value)
            .ok_or_else(|| RecordError::MissingId {
                table: self.name.clone(),
                field: id_field.to_string(),
            })?;
        Ok(Record::new(
            id,
            self.name.clone(),
            content,
            Arc::clone(&self.remote),
            self.config.clone(),
            Arc::clone(&self.observers),
        ))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TABLE_DISPLAY_PREFIX}: {}", self.name)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
