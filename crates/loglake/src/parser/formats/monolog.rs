//! Monolog detector (`[timestamp] channel.LEVEL: message {json}`).

use crate::parser::FormatDetector;
use crate::record::{Record, Value};

/// Accepts bracket-timestamped Monolog records as emitted by Laravel/PHP.
///
/// A trailing `{...}` is treated as JSON context and merged into the record
/// (splitting at the *last* `{`, so messages ending in literal braces can be
/// misclassified; that trade-off is accepted). A message prefix ending in
/// `:` disables the JSON interpretation since it usually marks quoted JSON
/// inside the message itself.
pub struct MonologDetector;

impl FormatDetector for MonologDetector {
    fn try_parse(&self, line: &str) -> Option<Record> {
        let inner = line.strip_prefix('[')?;
        let ts_end = inner.find(']')?;
        let timestamp = &inner[..ts_end];
        let rest = inner[ts_end + 1..].trim();
        if rest.is_empty() {
            return None;
        }

        let colon = rest.find(':')?;
        let channel_level = rest[..colon].trim();
        if channel_level.is_empty() {
            return None;
        }

        // channel.level with exactly one dot, both sides non-empty
        let mut pieces = channel_level.split('.');
        let (channel, level) = match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(channel), Some(level), None) if !channel.is_empty() && !level.is_empty() => {
                (channel, level)
            }
            _ => return None,
        };

        let message_and_json = rest[colon + 1..].trim();
        if message_and_json.is_empty() {
            return None;
        }
        // A valid record has a space right after the colon
        if rest.as_bytes().get(colon + 1) != Some(&b' ') {
            return None;
        }

        let mut record = Record::from([
            ("timestamp".to_string(), Value::Text(timestamp.to_string())),
            ("channel".to_string(), Value::Text(channel.to_string())),
            ("level".to_string(), Value::Text(level.to_string())),
        ]);

        if message_and_json.ends_with('}') {
            if let Some(brace) = message_and_json.rfind('{') {
                let json_part = &message_and_json[brace..];
                let message_part = message_and_json[..brace].trim_end();
                if !message_part.ends_with(':') {
                    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(json_part) {
                        for (key, value) in map {
                            record.insert(key, Value::from_json(value));
                        }
                        record.insert(
                            "message".to_string(),
                            Value::Text(message_part.to_string()),
                        );
                        return Some(record);
                    }
                }
            }
        }

        record.insert(
            "message".to_string(),
            Value::Text(message_and_json.to_string()),
        );
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_parse(line: &str) -> Option<Record> {
        MonologDetector.try_parse(line)
    }

    #[test]
    fn test_with_json_context() {
        let record = try_parse(
            r#"[2025-09-21 22:35:12] local.DEBUG: User logged in {"id":1,"email":"john@example.com"}"#,
        )
        .unwrap();

        assert_eq!(
            record["timestamp"],
            Value::Text("2025-09-21 22:35:12".to_string())
        );
        assert_eq!(record["channel"], Value::Text("local".to_string()));
        assert_eq!(record["level"], Value::Text("DEBUG".to_string()));
        assert_eq!(record["message"], Value::Text("User logged in".to_string()));
        assert_eq!(record["id"], Value::Int(1));
        assert_eq!(
            record["email"],
            Value::Text("john@example.com".to_string())
        );
    }

    #[test]
    fn test_without_json_context() {
        let record =
            try_parse("[2025-09-21 22:35:12] production.ERROR: Database connection failed")
                .unwrap();

        assert_eq!(record.len(), 4);
        assert_eq!(record["channel"], Value::Text("production".to_string()));
        assert_eq!(record["level"], Value::Text("ERROR".to_string()));
        assert_eq!(
            record["message"],
            Value::Text("Database connection failed".to_string())
        );
    }

    #[test]
    fn test_prefix_ending_in_colon_disables_json() {
        let record = try_parse(r#"[2025-09-21 22:35:12] local.INFO: payload was: {"a":1}"#)
            .unwrap();

        // The brace tail stays part of the message
        assert_eq!(
            record["message"],
            Value::Text(r#"payload was: {"a":1}"#.to_string())
        );
        assert!(!record.contains_key("a"));
    }

    #[test]
    fn test_invalid_json_tail_stays_in_message() {
        let record = try_parse("[2025-09-21 22:35:12] local.INFO: weird {not json}").unwrap();
        assert_eq!(
            record["message"],
            Value::Text("weird {not json}".to_string())
        );
    }

    #[test]
    fn test_requires_channel_dot_level() {
        assert_eq!(try_parse("[2025-09-21 22:35:12] nodot: message"), None);
        assert_eq!(try_parse("[2025-09-21 22:35:12] too.many.dots: message"), None);
        assert_eq!(try_parse("[2025-09-21 22:35:12] .LEVEL: message"), None);
        assert_eq!(try_parse("[2025-09-21 22:35:12] channel.: message"), None);
    }

    #[test]
    fn test_requires_space_after_colon() {
        assert_eq!(try_parse("[2025-09-21 22:35:12] local.DEBUG:message"), None);
    }

    #[test]
    fn test_requires_leading_bracket_and_message() {
        assert_eq!(try_parse("2025-09-21 local.DEBUG: message"), None);
        assert_eq!(try_parse("[2025-09-21 22:35:12]"), None);
        assert_eq!(try_parse("[2025-09-21 22:35:12] local.DEBUG:"), None);
    }
}
