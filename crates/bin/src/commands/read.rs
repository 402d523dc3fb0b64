//! Read-only commands: `list`, `get` and `find`.

use crate::backend::open_table;
use crate::cli::{BackendConfig, FindArgs, ListArgs, RowArgs};
use crate::commands::{parse_id, parse_value};
use crate::output::{OutputFormat, print_records};

/// Run the `list` command
pub async fn list(
    config: &BackendConfig,
    args: &ListArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = open_table(config, &args.table).await?;
    let records = table.select_all().await?;
    print_records(&records, table.remote().id_field(), format)
}

/// Run the `get` command
pub async fn get(
    config: &BackendConfig,
    args: &RowArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = open_table(config, &args.table).await?;
    let record = table.select_by_id(parse_id(&args.id)).await?;
    match format {
        OutputFormat::Human => {
            for (field, value) in record.content()? {
                println!("{field:<12} {}", crate::output::cell(Some(&value)));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&record.content()?)?);
        }
    }
    Ok(())
}

/// Run the `find` command
pub async fn find(
    config: &BackendConfig,
    args: &FindArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = open_table(config, &args.table).await?;
    let value = parse_value(&args.value);
    let records = table.select_by_field(&args.field, &value).await?;
    print_records(&records, table.remote().id_field(), format)
}
