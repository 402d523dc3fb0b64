//! Output formatting helpers for human-readable and JSON output.

use objectbase::{Content, Record};
use serde_json::Value;

use crate::cli::Format;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Human => OutputFormat::Human,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let render = |cells: Vec<String>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    println!(
        "{}",
        render(headers.iter().map(|h| h.to_uppercase()).collect())
    );
    for row in rows {
        println!("{}", render(row.iter().take(col_count).cloned().collect()));
    }
}

/// Renders a cell without the quotes JSON puts around strings.
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Prints records as an aligned table or a JSON array.
///
/// Columns are the union of every record's fields, `id` first.
pub fn print_records(
    records: &[Record],
    id_field: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows: Vec<Content> = records.iter().map(Record::content_unchecked).collect();
    match format {
        OutputFormat::Human => {
            if rows.is_empty() {
                println!("No rows found.");
                return Ok(());
            }
            let mut columns = vec![id_field.to_string()];
            for row in &rows {
                for key in row.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|row| columns.iter().map(|c| cell(row.get(c))).collect())
                .collect();
            let headers: Vec<&str> = columns.iter().map(String::as_str).collect();
            print_table(&headers, &cells);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&rows)?);
        }
    }
    Ok(())
}
