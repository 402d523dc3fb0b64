//! In-memory remote store implementation
//!
//! This module provides an in-memory implementation of the `RemoteStore` trait, suitable for
//! testing, development, or offline use. It behaves like a table store with serial integer
//! primary keys and can persist itself to a JSON file.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{RemoteError, RemoteStore};
use crate::Result;
use crate::constants::ID_FIELD;
use crate::record::{Content, RecordId};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// Rows of one table, keyed by id.
#[derive(Debug, Clone, Default)]
struct TableRows {
    rows: BTreeMap<RecordId, Content>,
    /// Next serial id handed out by `insert`
    next_id: i64,
}

impl TableRows {
    fn reserve(&mut self, id: &RecordId) {
        if let RecordId::Int(n) = id {
            self.next_id = self.next_id.max(n.saturating_add(1));
        }
    }

    /// Stores a row, assigning the next serial id when `id_field` holds no usable id.
    fn put(&mut self, id_field: &str, mut content: Content) -> (RecordId, Content) {
        let id = match content.get(id_field).and_then(RecordId::from_value) {
            Some(id) => id,
            None => {
                let id = RecordId::Int(self.next_id.max(1));
                content.insert(id_field.to_string(), id.to_value());
                id
            }
        };
        self.reserve(&id);
        self.rows.insert(id.clone(), content.clone());
        (id, content)
    }
}

fn default_id_field() -> String {
    ID_FIELD.to_string()
}

fn is_default_id_field(id_field: &str) -> bool {
    id_field == ID_FIELD
}

/// Serializable form of the store. Rows are kept as lists because JSON object keys cannot
/// round-trip integer ids.
#[derive(Serialize, Deserialize)]
struct SerializableStore {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    #[serde(
        default = "default_id_field",
        skip_serializing_if = "is_default_id_field"
    )]
    id_field: String,
    tables: BTreeMap<String, Vec<Content>>,
}

/// A simple in-memory remote store.
///
/// Tables spring into existence on first insert. Ids are read from the id column (`id`
/// unless changed with [`with_id_field`](Self::with_id_field)); rows inserted without one
/// receive the next serial integer.
#[derive(Debug)]
pub struct InMemoryRemote {
    tables: RwLock<HashMap<String, TableRows>>,
    id_field: String,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self {
            tables: RwLock::default(),
            id_field: default_id_field(),
        }
    }
}

impl InMemoryRemote {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys rows on a column other than `id`.
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Inserts or replaces a row directly, bypassing the async API.
    ///
    /// Rows without a usable id are assigned the next serial id. Returns the row's id.
    pub fn seed(&self, table: &str, content: Content) -> RecordId {
        let mut tables = self.write();
        let rows = tables.entry(table.to_string()).or_default();
        rows.put(&self.id_field, content).0
    }

    /// Returns the number of rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.read().get(table).map_or(0, |rows| rows.rows.len())
    }

    /// Returns a copy of one row, if it exists.
    pub fn row(&self, table: &str, id: &RecordId) -> Option<Content> {
        self.read()
            .get(table)
            .and_then(|rows| rows.rows.get(id).cloned())
    }

    /// Saves every table to a JSON file.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let tables = self
            .read()
            .iter()
            .map(|(name, rows)| (name.clone(), rows.rows.values().cloned().collect()))
            .collect();
        let serializable = SerializableStore {
            version: PERSISTENCE_VERSION,
            id_field: self.id_field.clone(),
            tables,
        };
        let json = serde_json::to_string_pretty(&serializable)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Loads a store from a JSON file.
    ///
    /// If the file does not exist, a new, empty store is returned.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => {
                let serializable: SerializableStore = serde_json::from_str(&json)?;
                let store = Self::new().with_id_field(serializable.id_field);
                for (table, rows) in serializable.tables {
                    for content in rows {
                        store.seed(&table, content);
                    }
                }
                Ok(store)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, TableRows>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, TableRows>> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(table: &str, id: &RecordId) -> crate::Error {
    RemoteError::RecordNotFound {
        table: table.to_string(),
        id: id.clone(),
    }
    .into()
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn select_all(&self, table: &str) -> Result<Vec<Content>> {
        Ok(self
            .read()
            .get(table)
            .map(|rows| rows.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn select_by_id(&self, table: &str, id: &RecordId) -> Result<Content> {
        self.row(table, id).ok_or_else(|| not_found(table, id))
    }

    async fn select_by_field(
        &self,
        table: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Content>> {
        Ok(self
            .read()
            .get(table)
            .map(|rows| {
                rows.rows
                    .values()
                    .filter(|row| row.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, content: Content) -> Result<Content> {
        let mut tables = self.write();
        let rows = tables.entry(table.to_string()).or_default();
        if let Some(id) = content.get(&self.id_field).and_then(RecordId::from_value)
            && rows.rows.contains_key(&id)
        {
            return Err(RemoteError::Rejected {
                table: table.to_string(),
                status: 409,
                code: None,
                message: format!("duplicate key: {} {id} already exists", self.id_field),
            }
            .into());
        }
        let (id, row) = rows.put(&self.id_field, content);
        debug!(table, %id, "inserted row");
        Ok(row)
    }

    async fn update_field(
        &self,
        table: &str,
        id: &RecordId,
        field: &str,
        value: Value,
    ) -> Result<()> {
        if field == self.id_field {
            return Err(RemoteError::Rejected {
                table: table.to_string(),
                status: 400,
                code: None,
                message: format!("the id column '{field}' is immutable"),
            }
            .into());
        }
        let mut tables = self.write();
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.rows.get_mut(id))
            .ok_or_else(|| not_found(table, id))?;
        row.insert(field.to_string(), value);
        Ok(())
    }

    async fn delete(&self, table: &str, id: &RecordId) -> Result<()> {
        let mut tables = self.write();
        tables
            .get_mut(table)
            .and_then(|rows| rows.rows.remove(id))
            .map(|_| ())
            .ok_or_else(|| not_found(table, id))
    }

    fn id_field(&self) -> &str {
        &self.id_field
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
