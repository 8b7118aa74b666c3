//! Record normalisation ahead of schema resolution and insert.

use std::collections::HashMap;

use crate::record::{Record, Value};
use crate::store::types::ColumnType;

/// Flattens nested objects into underscore-joined columns and encodes
/// arrays as JSON text.
///
/// `{"user": {"info": {"name": "Alice"}}}` becomes `{"user_info_name":
/// "Alice"}`. Scalars pass through untouched, so the function is idempotent
/// on already-flat records.
pub(crate) fn flatten(record: Record) -> Record {
    let mut flat = Record::new();
    for (key, value) in record {
        match value {
            Value::Object(inner) => {
                for (child_key, child_value) in flatten(inner) {
                    flat.insert(format!("{key}_{child_key}"), child_value);
                }
            }
            Value::Array(items) => {
                let encoded = serde_json::to_string(&items)
                    .unwrap_or_else(|_| format!("{items:?}"));
                flat.insert(key, Value::Json(encoded));
            }
            other => {
                flat.insert(key, other);
            }
        }
    }
    flat
}

/// Prefixes bare `HH:MM:SS...` text values with the date of the row
/// timestamp, for columns that are already Timestamp-typed.
///
/// Freshly added columns are not in `schema` yet, so a partial value on the
/// insert that creates its column passes through unrepaired.
pub(crate) fn repair_partial_timestamps(
    mut record: Record,
    schema: &HashMap<String, ColumnType>,
) -> Record {
    let Some(date) = record.get("timestamp").and_then(timestamp_date) else {
        return record;
    };

    for (column, value) in record.iter_mut() {
        if column == "timestamp" || schema.get(column) != Some(&ColumnType::Timestamp) {
            continue;
        }
        if let Value::Text(text) = value {
            let b = text.as_bytes();
            if b.len() >= 8 && b[2] == b':' && b[5] == b':' {
                *value = Value::Text(format!("{date} {text}"));
            }
        }
    }
    record
}

/// The `YYYY-MM-DD` portion of the row timestamp, if one can be produced.
fn timestamp_date(timestamp: &Value) -> Option<String> {
    match timestamp {
        Value::Timestamp(ts) => Some(ts.format("%Y-%m-%d").to_string()),
        Value::Text(text) => text.get(..10).map(str::to_string),
        _ => None,
    }
}
