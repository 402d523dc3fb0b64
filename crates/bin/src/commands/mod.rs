//! Subcommand implementations.

use objectbase::{Content, RecordId};
use serde_json::Value;

pub mod read;
pub mod write;

/// Parses a command-line id: integers become numeric ids, anything else a text id.
pub fn parse_id(raw: &str) -> RecordId {
    raw.parse::<i64>()
        .map(RecordId::Int)
        .unwrap_or_else(|_| RecordId::Text(raw.to_string()))
}

/// Parses a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parses `field=value` pairs, preserving their order.
pub fn parse_assignments(pairs: &[String]) -> Result<Vec<(String, Value)>, String> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((field, value)) if !field.is_empty() => {
                Ok((field.to_string(), parse_value(value)))
            }
            _ => Err(format!("expected field=value, got '{pair}'")),
        })
        .collect()
}

/// Collects assignments into row content; later duplicates win.
pub fn to_content(assignments: Vec<(String, Value)>) -> Content {
    assignments.into_iter().collect()
}
