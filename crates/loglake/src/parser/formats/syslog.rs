//! Syslog detector (RFC 3164 and RFC 5424).

use crate::parser::FormatDetector;
use crate::record::{Record, Value};

/// Accepts lines carrying a syslog `<priority>` prefix.
///
/// The first byte after the priority selects the variant: a digit means
/// RFC 5424 (versioned header, optional `[structured data]`), anything else
/// is treated as the legacy RFC 3164 `timestamp hostname tag: message`
/// shape. Month abbreviations are not validated.
pub struct SyslogDetector;

impl FormatDetector for SyslogDetector {
    fn try_parse(&self, line: &str) -> Option<Record> {
        let after_prefix = line.strip_prefix('<')?;
        let pri_end = after_prefix.find('>')?;
        let priority: i64 = after_prefix[..pri_end].parse().ok()?;
        let rest = &after_prefix[pri_end + 1..];

        let mut record = Record::from([
            ("priority".to_string(), Value::Int(priority)),
            ("facility".to_string(), Value::Int(priority / 8)),
            ("severity".to_string(), Value::Int(priority % 8)),
        ]);

        if rest.as_bytes().first().is_some_and(u8::is_ascii_digit) {
            parse_rfc5424(rest, &mut record)?;
        } else {
            parse_rfc3164(rest, &mut record)?;
        }
        Some(record)
    }
}

/// Header: `version timestamp hostname app-name procid msgid`, then optional
/// structured data and the free-form message.
fn parse_rfc5424(rest: &str, record: &mut Record) -> Option<()> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() < 7 {
        return None;
    }

    record.insert(
        "version".to_string(),
        Value::Int(parts[0].parse().unwrap_or(0)),
    );
    record.insert("timestamp".to_string(), Value::Text(parts[1].to_string()));
    record.insert("hostname".to_string(), Value::Text(parts[2].to_string()));
    record.insert("app_name".to_string(), Value::Text(parts[3].to_string()));
    record.insert("procid".to_string(), Value::Text(parts[4].to_string()));
    record.insert("msgid".to_string(), Value::Text(parts[5].to_string()));

    match (rest.find('['), rest.find(']')) {
        (Some(sd_start), Some(sd_end)) if sd_end > sd_start => {
            record.insert(
                "structured_data".to_string(),
                Value::Object(parse_structured_data(&rest[sd_start + 1..sd_end])),
            );
            record.insert(
                "message".to_string(),
                Value::Text(rest[sd_end + 1..].trim().to_string()),
            );
        }
        _ => {
            record.insert("structured_data".to_string(), Value::Object(Record::new()));
            record.insert("message".to_string(), Value::Text(parts[6..].join(" ")));
        }
    }
    Some(())
}

/// Legacy shape: `Mon DD HH:MM:SS hostname tag: message`.
fn parse_rfc3164(rest: &str, record: &mut Record) -> Option<()> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() < 4 {
        return None;
    }

    let timestamp = format!("{} {} {}", parts[0], parts[1], parts[2]);
    let remaining = parts[4..].join(" ");

    let colon = remaining.find(':')?;
    let tag = remaining[..colon].trim().to_string();
    let message = remaining[colon + 1..].trim().to_string();

    record.insert("timestamp".to_string(), Value::Text(timestamp));
    record.insert("hostname".to_string(), Value::Text(parts[3].to_string()));
    record.insert("tag".to_string(), Value::Text(tag));
    record.insert("message".to_string(), Value::Text(message));
    Some(())
}

/// Parses `[sd-id key="value" ...]` contents. A first token containing `@`
/// is recorded as `sd_id`; tokens without `=` are ignored.
fn parse_structured_data(content: &str) -> Record {
    let mut data = Record::new();
    let mut parts = content.split_whitespace().peekable();

    if parts.peek().is_some_and(|first| first.contains('@')) {
        if let Some(sd_id) = parts.next() {
            data.insert("sd_id".to_string(), Value::Text(sd_id.to_string()));
        }
    }

    for part in parts {
        if let Some(eq) = part.find('=') {
            let key = &part[..eq];
            let mut value = &part[eq + 1..];
            if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
                value = &value[1..value.len() - 1];
            }
            data.insert(key.to_string(), Value::Text(value.to_string()));
        }
    }
    data
}
