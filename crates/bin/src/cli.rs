//! CLI argument definitions for the Objectbase binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Remote store type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// PostgREST or Supabase REST endpoint (default)
    Postgrest,
    /// In-memory with JSON persistence (for development and offline use)
    Inmemory,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
}

/// Objectbase: fire writes at a remote table, sync, then read
#[derive(Parser, Debug)]
#[command(name = "objectbase")]
#[command(about = "Objectbase: write-barrier records over a remote table store")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options selecting and configuring the remote store
#[derive(clap::Args, Debug, Clone)]
pub struct BackendConfig {
    /// Remote store to use
    #[arg(
        short,
        long,
        global = true,
        default_value = "postgrest",
        env = "OBJECTBASE_BACKEND"
    )]
    pub backend: Backend,

    /// Base URL of the PostgREST endpoint (required when backend=postgrest)
    #[arg(long, global = true, env = "OBJECTBASE_URL")]
    pub url: Option<String>,

    /// API key sent as `apikey` and bearer token
    #[arg(long, global = true, env = "OBJECTBASE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// JSON file the in-memory backend loads from and saves to
    #[arg(
        short = 'D',
        long,
        global = true,
        default_value = "objectbase.json",
        env = "OBJECTBASE_DATA_FILE"
    )]
    pub data_file: PathBuf,

    /// Per-operation timeout in milliseconds
    #[arg(long, global = true, env = "OBJECTBASE_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every row of a table
    List(ListArgs),
    /// Show one row by id
    Get(RowArgs),
    /// List rows whose field equals a value
    Find(FindArgs),
    /// Insert a row from field=value pairs
    Insert(InsertArgs),
    /// Update fields of a row, all writes in flight at once
    Set(SetArgs),
    /// Delete a row
    Delete(RowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    pub table: String,
}

#[derive(clap::Args, Debug)]
pub struct RowArgs {
    pub table: String,
    /// Row id; integers are treated as numeric ids
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct FindArgs {
    pub table: String,
    pub field: String,
    /// Value to match, parsed as JSON when valid
    pub value: String,
}

#[derive(clap::Args, Debug)]
pub struct InsertArgs {
    pub table: String,
    /// Fields as field=value; values are parsed as JSON when valid
    #[arg(required = true)]
    pub fields: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    pub table: String,
    pub id: String,
    /// Fields as field=value; values are parsed as JSON when valid
    #[arg(required = true)]
    pub fields: Vec<String>,
}
