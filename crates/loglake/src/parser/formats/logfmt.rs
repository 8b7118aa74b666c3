//! logfmt detector (`key=value` token streams).

use crate::parser::FormatDetector;
use crate::record::{Record, Value};

/// Accepts lines made of whitespace-separated `key=value` pairs.
///
/// Quoted values may span several tokens. Tokens without `=` are skipped;
/// the line matches as long as at least one pair was accepted. Values parse
/// as integer, then float, then text.
pub struct LogfmtDetector;

impl FormatDetector for LogfmtDetector {
    fn try_parse(&self, line: &str) -> Option<Record> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            return None;
        }

        let mut record = Record::new();
        let mut i = 0;
        while i < parts.len() {
            let part = parts[i];
            let Some(eq) = part.find('=') else {
                i += 1;
                continue;
            };
            let key = &part[..eq];
            let mut value = part[eq + 1..].to_string();

            if value.starts_with('"') {
                if value.ends_with('"') && value.len() > 1 {
                    value = value[1..value.len() - 1].to_string();
                } else {
                    // Quoted value spanning several tokens
                    value.remove(0);
                    i += 1;
                    while i < parts.len() {
                        let next = parts[i];
                        value.push(' ');
                        if let Some(closing) = next.strip_suffix('"') {
                            value.push_str(closing);
                            break;
                        }
                        value.push_str(next);
                        i += 1;
                    }
                }
            }

            record.insert(key.to_string(), coerce_scalar(value));
            i += 1;
        }

        if record.is_empty() {
            None
        } else {
            Some(record)
        }
    }
}

fn coerce_scalar(value: String) -> Value {
    if let Ok(int) = value.parse::<i64>() {
        return Value::Int(int);
    }
    if let Ok(float) = value.parse::<f64>() {
        return Value::Float(float);
    }
    Value::Text(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_parse(line: &str) -> Option<Record> {
        LogfmtDetector.try_parse(line)
    }

    #[test]
    fn test_standard_line() {
        let record = try_parse(
            r#"time=2025-09-19T20:35:00Z level=info service=user-api msg="User login successful" user_id=123"#,
        )
        .unwrap();

        assert_eq!(record.len(), 5);
        assert_eq!(
            record["time"],
            Value::Text("2025-09-19T20:35:00Z".to_string())
        );
        assert_eq!(record["level"], Value::Text("info".to_string()));
        assert_eq!(record["service"], Value::Text("user-api".to_string()));
        assert_eq!(
            record["msg"],
            Value::Text("User login successful".to_string())
        );
        assert_eq!(record["user_id"], Value::Int(123));
    }

    #[test]
    fn test_numbers_and_quotes() {
        let record = try_parse(
            r#"service=user-api status=200 response_time=0.45 method=POST path="/api/login" user_id=456"#,
        )
        .unwrap();

        assert_eq!(record.len(), 6);
        assert_eq!(record["status"], Value::Int(200));
        assert_eq!(record["response_time"], Value::Float(0.45));
        assert_eq!(record["method"], Value::Text("POST".to_string()));
        assert_eq!(record["path"], Value::Text("/api/login".to_string()));
        assert_eq!(record["user_id"], Value::Int(456));
    }

    #[test]
    fn test_simple_unquoted() {
        let record = try_parse("level=debug msg=simple_message count=42").unwrap();

        assert_eq!(record.len(), 3);
        assert_eq!(record["level"], Value::Text("debug".to_string()));
        assert_eq!(record["msg"], Value::Text("simple_message".to_string()));
        assert_eq!(record["count"], Value::Int(42));
    }

    #[test]
    fn test_tokens_without_equals_are_skipped() {
        let record = try_parse("key1=value1 garbage key2=value2").unwrap();

        assert_eq!(record.len(), 2);
        assert_eq!(record["key1"], Value::Text("value1".to_string()));
        assert_eq!(record["key2"], Value::Text("value2".to_string()));
    }

    #[test]
    fn test_line_without_pairs_fails() {
        assert_eq!(try_parse("this is not a logfmt line"), None);
        assert_eq!(try_parse(""), None);
    }

    #[test]
    fn test_empty_quoted_value() {
        let record = try_parse(r#"key="" other=1"#).unwrap();
        assert_eq!(record["key"], Value::Text(String::new()));
        assert_eq!(record["other"], Value::Int(1));
    }
}
