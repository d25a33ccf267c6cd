pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Locate the row-oriented payload in a result document: an amortization
/// schedule's `payments`, a bare array, or nothing.
pub(crate) fn payment_rows(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(rows) => Some(rows),
        Value::Object(map) => map
            .get("payments")
            .or_else(|| map.get("result").and_then(|r| r.get("payments")))
            .and_then(Value::as_array),
        _ => None,
    }
}
