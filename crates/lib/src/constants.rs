//! Constants used throughout the Objectbase library.
//!
//! This module provides central definitions for column names, wire-level strings and
//! defaults shared between the record engine and the remote backends.

/// Default name of the identifier column assigned by the backing store.
pub const ID_FIELD: &str = "id";

/// Prefix used by `Display` for tables.
pub const TABLE_DISPLAY_PREFIX: &str = "Objectbase table";

/// Default tracing directive installed by the CLI and the test harness.
pub const DEFAULT_LOG_DIRECTIVE: &str = "objectbase=info";

/// PostgREST media type requesting a single JSON object instead of an array.
pub const PGRST_OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// PostgREST preference asking mutations to echo the affected rows.
pub const PGRST_RETURN_REPRESENTATION: &str = "return=representation";
