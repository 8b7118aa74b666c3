//! JSON object detector.

use crate::parser::FormatDetector;
use crate::record::{Record, Value};

/// Accepts lines that decode, in full, as a JSON object.
///
/// Arrays and scalars are rejected so that bare numbers or bracketed text
/// reach the later detectors. `{}` is a valid match producing an empty
/// record.
pub struct JsonDetector;

impl FormatDetector for JsonDetector {
    fn try_parse(&self, line: &str) -> Option<Record> {
        match serde_json::from_str(line).ok()? {
            serde_json::Value::Object(map) => Some(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from_json(value)))
                    .collect(),
            ),
            _ => None,
        }
    }
}
