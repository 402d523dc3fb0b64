//! Mutating commands: `insert`, `set` and `delete`.

use crate::backend::{open_table, persist};
use crate::cli::{BackendConfig, InsertArgs, RowArgs, SetArgs};
use crate::commands::{parse_assignments, parse_id, to_content};
use crate::output::{OutputFormat, cell};

/// Run the `insert` command
pub async fn insert(
    config: &BackendConfig,
    args: &InsertArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = open_table(config, &args.table).await?;
    let content = to_content(parse_assignments(&args.fields)?);
    let record = table.insert(content).await?;
    persist(config, &table).await?;

    match format {
        OutputFormat::Human => println!("Inserted {} into {}", record.id(), table.name()),
        OutputFormat::Json => println!("{}", serde_json::to_string(&record.content()?)?),
    }
    Ok(())
}

/// Run the `set` command
///
/// Every field write is issued before any of them is awaited, then a single `sync` waits for
/// the lot. Fields whose write failed are reported individually.
pub async fn set(
    config: &BackendConfig,
    args: &SetArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = open_table(config, &args.table).await?;
    let assignments = parse_assignments(&args.fields)?;
    let record = table.select_by_id(parse_id(&args.id)).await?;
    let accessor = record.accessor();

    let operations: Vec<_> = assignments
        .iter()
        .map(|(field, value)| accessor.write(field, value))
        .collect();
    tracing::debug!(writes = operations.len(), "issued writes, waiting for sync");
    accessor.sync().await;
    persist(config, &table).await?;

    let failures: Vec<(String, String)> = operations
        .iter()
        .filter_map(|op| {
            let outcome = op.outcome()?;
            let error = outcome.error()?;
            Some((outcome.field().unwrap_or_default().to_string(), error.to_string()))
        })
        .collect();

    match format {
        OutputFormat::Human => {
            for (field, error) in &failures {
                eprintln!("{field}: {error}");
            }
            if record.ready_to_read() {
                for (field, value) in record.content()? {
                    println!("{field:<12} {}", cell(Some(&value)));
                }
            }
        }
        OutputFormat::Json => {
            let failed: serde_json::Map<_, _> = failures
                .iter()
                .map(|(field, error)| (field.clone(), serde_json::Value::from(error.as_str())))
                .collect();
            let value = serde_json::json!({
                "record": record.content_unchecked(),
                "failed": failed,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} of {} writes failed", failures.len(), operations.len()).into())
    }
}

/// Run the `delete` command
pub async fn delete(
    config: &BackendConfig,
    args: &RowArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = open_table(config, &args.table).await?;
    let record = table.select_by_id(parse_id(&args.id)).await?;
    let outcome = record.delete().wait().await;
    persist(config, &table).await?;

    if let Some(error) = outcome.error() {
        return Err(error.clone().into());
    }
    match format {
        OutputFormat::Human => println!("Deleted {} from {}", record.id(), table.name()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "deleted": record.id(), "table": table.name() })
        ),
    }
    Ok(())
}
