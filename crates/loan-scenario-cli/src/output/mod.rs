pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Split a result object into scalar rows (nested objects flattened with
/// dotted keys) and named arrays of row objects (schedule entries, deltas).
pub(crate) fn split_rows(
    map: &Map<String, Value>,
) -> (Vec<(String, Value)>, Vec<(String, Vec<Value>)>) {
    let mut scalars = Vec::new();
    let mut arrays = Vec::new();
    flatten_into("", map, &mut scalars, &mut arrays);
    (scalars, arrays)
}

fn flatten_into(
    prefix: &str,
    map: &Map<String, Value>,
    scalars: &mut Vec<(String, Value)>,
    arrays: &mut Vec<(String, Vec<Value>)>,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(&name, inner, scalars, arrays),
            Value::Array(items) if items.first().is_some_and(Value::is_object) => {
                arrays.push((name, items.clone()))
            }
            _ => scalars.push((name, val.clone())),
        }
    }
}

/// Render a scalar JSON value as plain text.
pub(crate) fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(plain).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
