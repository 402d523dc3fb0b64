//! Remote store creation and persistence.

use std::sync::Arc;
use std::time::Duration;

use objectbase::{InMemoryRemote, PostgrestRemote, RecordConfig, RemoteStore, Table};

use crate::cli::{Backend, BackendConfig};

/// Redact everything but scheme, host and path from a URL for safe logging.
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{base}?***"),
        None => url.to_string(),
    }
}

/// Human label for the configured backend.
pub fn backend_label(config: &BackendConfig) -> String {
    match config.backend {
        Backend::Postgrest => format!(
            "postgrest ({})",
            config.url.as_deref().map(redact_url).unwrap_or_default()
        ),
        Backend::Inmemory => format!("inmemory ({})", config.data_file.display()),
    }
}

/// Create the remote store selected by the configuration.
pub async fn create_remote(
    config: &BackendConfig,
) -> Result<Arc<dyn RemoteStore>, Box<dyn std::error::Error>> {
    match config.backend {
        Backend::Postgrest => {
            let url = config
                .url
                .as_ref()
                .ok_or("PostgREST backend requires --url or OBJECTBASE_URL")?;
            tracing::info!("Using PostgREST backend at {}", redact_url(url));
            let mut remote = PostgrestRemote::new(url)?;
            if let Some(key) = &config.api_key {
                remote = remote.with_api_key(key);
            }
            Ok(Arc::new(remote))
        }
        Backend::Inmemory => {
            let path = &config.data_file;
            tracing::info!(
                "Using in-memory backend with persistence at {}",
                path.display()
            );
            Ok(Arc::new(InMemoryRemote::load_from_file(path).await?))
        }
    }
}

/// Opens a table on a freshly created remote store.
pub async fn open_table(
    config: &BackendConfig,
    name: &str,
) -> Result<Table, Box<dyn std::error::Error>> {
    let remote = create_remote(config).await?;
    let mut record_config = RecordConfig::default();
    if let Some(ms) = config.timeout_ms {
        record_config = record_config.with_operation_timeout(Duration::from_millis(ms));
    }
    Ok(Table::new(remote, name).with_config(record_config))
}

/// Writes the in-memory store back to its data file. No-op for other backends.
pub async fn persist(
    config: &BackendConfig,
    table: &Table,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(in_memory) = table.remote().as_any().downcast_ref::<InMemoryRemote>() {
        in_memory.save_to_file(&config.data_file).await?;
        tracing::debug!("Saved data to {}", config.data_file.display());
    }
    Ok(())
}
