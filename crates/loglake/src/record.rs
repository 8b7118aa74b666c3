//! Typed records: the unit of data flowing from the parser into the store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::store::types::ColumnType;

/// An unordered mapping from field name to typed value.
///
/// Produced by [`crate::parse`] or assembled by callers. Duplicate keys are
/// not preserved; the last write wins.
pub type Record = BTreeMap<String, Value>;

/// Runtime value of a single record field.
///
/// Scalar variants mirror the analytical column types; `Array` and `Object`
/// are structural and are resolved away by the writer (arrays become JSON
/// text, objects are flattened into underscore-joined columns). The `Json`
/// variant carries already-serialised JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
    Json(String),
    Array(Vec<Value>),
    Object(Record),
}

impl Value {
    /// Converts a decoded JSON value, preserving integer precision.
    ///
    /// Numbers that fit a signed 64-bit integer become `Int`; everything
    /// else that round-trips through a finite `f64` becomes `Float`; the
    /// remainder keeps its textual source form.
    pub fn from_json(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                    Value::Float(f)
                } else {
                    Value::Text(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Timestamp(ts) => {
                serializer.serialize_str(&ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
            }
            Value::Text(s) | Value::Json(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(record) => {
                let mut map = serializer.serialize_map(Some(record.len()))?;
                for (key, value) in record {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Attaches the row-level reference timestamp to a record.
///
/// A `timestamp` field supplied by the caller is kept only when its inferred
/// column type is Timestamp; anything else is overwritten by `reference`.
pub fn record_with_timestamp(reference: DateTime<Utc>, mut record: Record) -> Record {
    let keep = record
        .get("timestamp")
        .is_some_and(|value| ColumnType::infer(value) == ColumnType::Timestamp);
    if !keep {
        record.insert("timestamp".to_string(), Value::Timestamp(reference));
    }
    record
}
