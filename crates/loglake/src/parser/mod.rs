//! Cascaded line parsing.
//!
//! A raw log line runs through an ordered list of format detectors; the
//! first detector that recognises the line produces the record. Lines no
//! detector claims become `{"message": <line>}` with ANSI colour escapes
//! stripped.

pub mod ansi;
pub mod formats;

use std::sync::LazyLock;

use crate::record::{Record, Value};

pub use ansi::strip_ansi_codes;

/// A single strategy in the parsing cascade.
pub trait FormatDetector: Send + Sync {
    /// Attempts to decode `line`; `None` hands the line to the next detector.
    fn try_parse(&self, line: &str) -> Option<Record>;
}

// Order matters: more specific formats first.
static DETECTORS: LazyLock<Vec<Box<dyn FormatDetector>>> = LazyLock::new(|| {
    vec![
        Box::new(formats::json::JsonDetector),
        Box::new(formats::syslog::SyslogDetector),
        Box::new(formats::clf::ClfDetector),
        Box::new(formats::logfmt::LogfmtDetector),
        Box::new(formats::monolog::MonologDetector),
    ]
});

/// Parses one log line into a typed record.
///
/// An empty line yields an empty record. Any non-empty line yields a
/// non-empty record: either the output of the first matching detector, or
/// the stripped line under a single `message` field.
pub fn parse(line: &str) -> Record {
    if line.is_empty() {
        return Record::new();
    }

    for detector in DETECTORS.iter() {
        if let Some(record) = detector.try_parse(line) {
            return record;
        }
    }

    Record::from([(
        "message".to_string(),
        Value::Text(strip_ansi_codes(line).into_owned()),
    )])
}
