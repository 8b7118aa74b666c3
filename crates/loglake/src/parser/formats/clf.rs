//! Apache access log detector (Common, Combined and Extended formats).

use crate::parser::FormatDetector;
use crate::record::{Record, Value};

/// Accepts Common Log Format lines and their Combined/Extended extensions.
///
/// Two timestamp shapes are recognised: the canonical bracketed
/// `[10/Oct/2000:13:55:36 -0700]` and a bracket-less variant where the
/// timestamp tokens run up to the quoted request. Fields holding the
/// literal `-` are omitted from the record.
pub struct ClfDetector;

impl FormatDetector for ClfDetector {
    fn try_parse(&self, line: &str) -> Option<Record> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            return None;
        }

        let request_index = parts.iter().position(|part| part.starts_with('"'))?;
        if request_index < 3 {
            return None;
        }

        let mut record = Record::new();
        if parts[0] != "-" {
            record.insert("remote_host".to_string(), Value::Text(parts[0].to_string()));
        }
        if parts[1] != "-" {
            record.insert(
                "remote_logname".to_string(),
                Value::Text(parts[1].to_string()),
            );
        }

        let bracketed = parts[3].starts_with('[');
        if bracketed {
            if parts[2] != "-" {
                record.insert("remote_user".to_string(), Value::Text(parts[2].to_string()));
            }
            if request_index > 3 {
                let mut timestamp = parts[3..request_index].join(" ");
                if timestamp.len() >= 2 && timestamp.starts_with('[') && timestamp.ends_with(']') {
                    timestamp = timestamp[1..timestamp.len() - 1].to_string();
                }
                record.insert("timestamp".to_string(), Value::Text(timestamp));
            }
        } else if request_index > 2 {
            // No brackets: the user field is absent and the timestamp starts
            // right after remote_logname.
            record.insert(
                "timestamp".to_string(),
                Value::Text(parts[2..request_index].join(" ")),
            );
        }

        // The quoted request may span several tokens.
        let mut request_end = request_index;
        if !parts[request_index].ends_with('"') {
            for i in request_index + 1..parts.len() {
                request_end = i;
                if parts[i].ends_with('"') {
                    break;
                }
            }
        }
        let mut request = parts[request_index..=request_end].join(" ");
        if request.len() >= 2 && request.starts_with('"') && request.ends_with('"') {
            request = request[1..request.len() - 1].to_string();
        }

        let request_parts: Vec<&str> = request.split(' ').collect();
        if request_parts.len() >= 3 {
            record.insert("method".to_string(), Value::Text(request_parts[0].to_string()));
            record.insert("path".to_string(), Value::Text(request_parts[1].to_string()));
            record.insert(
                "protocol".to_string(),
                Value::Text(request_parts[2].to_string()),
            );
        } else if request_parts.len() == 2 {
            record.insert("method".to_string(), Value::Text(request_parts[0].to_string()));
            record.insert("path".to_string(), Value::Text(request_parts[1].to_string()));
            record.insert(
                "protocol".to_string(),
                Value::Text("HTTP/1.0".to_string()),
            );
        } else {
            record.insert("request".to_string(), Value::Text(request));
        }

        if let Some(status) = parts.get(request_end + 1) {
            if let Ok(status) = status.parse::<i64>() {
                record.insert("status".to_string(), Value::Int(status));
            }
        }

        match parts.get(request_end + 2) {
            Some(&"-") => {
                record.insert("response_size".to_string(), Value::Int(0));
            }
            Some(size) => {
                if let Ok(size) = size.parse::<i64>() {
                    record.insert("response_size".to_string(), Value::Int(size));
                }
            }
            None => {
                if bracketed {
                    // The bracketed form requires a size field.
                    return None;
                }
                record.insert("response_size".to_string(), Value::Int(0));
            }
        }

        let remaining_start = request_end + 3;
        if remaining_start < parts.len() {
            let quoted = parse_quoted_fields(&parts[remaining_start..]);
            if let Some(referer) = quoted.first() {
                if referer != "-" && !referer.is_empty() {
                    record.insert("referer".to_string(), Value::Text(referer.clone()));
                }
            }
            if let Some(user_agent) = quoted.get(1) {
                if user_agent != "-" && !user_agent.is_empty() {
                    record.insert("user_agent".to_string(), Value::Text(user_agent.clone()));
                }
            }
            if let Some(forwarded_for) = quoted.get(2) {
                if forwarded_for != "-" {
                    record.insert(
                        "forwarded_for".to_string(),
                        Value::Text(forwarded_for.clone()),
                    );
                }
            }
        }

        Some(record)
    }
}

/// Reassembles possibly multi-token quoted strings from a token slice.
/// Empty quoted strings are preserved; unterminated quotes are dropped.
fn parse_quoted_fields(parts: &[&str]) -> Vec<String> {
    let mut fields = Vec::new();
    let mut i = 0;
    while i < parts.len() {
        let part = parts[i];
        if part.starts_with('"') {
            let mut joined = part.to_string();
            if !part.ends_with('"') {
                i += 1;
                while i < parts.len() {
                    joined.push(' ');
                    joined.push_str(parts[i]);
                    if parts[i].ends_with('"') {
                        break;
                    }
                    i += 1;
                }
            }
            if joined.len() >= 2 && joined.starts_with('"') && joined.ends_with('"') {
                fields.push(joined[1..joined.len() - 1].to_string());
            }
        } else {
            fields.push(part.to_string());
        }
        i += 1;
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_parse(line: &str) -> Option<Record> {
        ClfDetector.try_parse(line)
    }

    #[test]
    fn test_standard_line() {
        let record = try_parse(
            r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326"#,
        )
        .unwrap();

        assert_eq!(record.len(), 8);
        assert_eq!(record["remote_host"], Value::Text("127.0.0.1".to_string()));
        assert!(!record.contains_key("remote_logname"));
        assert_eq!(record["remote_user"], Value::Text("frank".to_string()));
        assert_eq!(
            record["timestamp"],
            Value::Text("10/Oct/2000:13:55:36 -0700".to_string())
        );
        assert_eq!(record["method"], Value::Text("GET".to_string()));
        assert_eq!(record["path"], Value::Text("/apache_pb.gif".to_string()));
        assert_eq!(record["protocol"], Value::Text("HTTP/1.0".to_string()));
        assert_eq!(record["status"], Value::Int(200));
        assert_eq!(record["response_size"], Value::Int(2326));
    }

    #[test]
    fn test_dash_size_becomes_zero() {
        let record = try_parse(
            r#"192.168.1.1 - - [15/Dec/2023:10:30:45 +0000] "POST /api/login HTTP/1.1" 401 -"#,
        )
        .unwrap();

        assert_eq!(record.len(), 7);
        assert!(!record.contains_key("remote_logname"));
        assert!(!record.contains_key("remote_user"));
        assert_eq!(record["response_size"], Value::Int(0));
    }

    #[test]
    fn test_bracketed_form_requires_size() {
        assert_eq!(
            try_parse(
                r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200"#
            ),
            None
        );
    }

    #[test]
    fn test_unbracketed_timestamp() {
        let record =
            try_parse(r#"10.10.2.11 -  21/Sep/2025:19:41:57 +0000 "GET /init.php" 200"#).unwrap();

        assert!(!record.contains_key("remote_user"));
        assert_eq!(
            record["timestamp"],
            Value::Text("21/Sep/2025:19:41:57 +0000".to_string())
        );
        assert_eq!(record["method"], Value::Text("GET".to_string()));
        assert_eq!(record["path"], Value::Text("/init.php".to_string()));
        // Protocol defaults when the request has only method and path
        assert_eq!(record["protocol"], Value::Text("HTTP/1.0".to_string()));
        assert_eq!(record["status"], Value::Int(200));
        // Size is optional without brackets
        assert_eq!(record["response_size"], Value::Int(0));
    }

    #[test]
    fn test_combined_format() {
        let record = try_parse(
            r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326 "http://www.example.com/start.html" "Mozilla/4.08 [en] (Win98; I ;Nav)""#,
        )
        .unwrap();

        assert_eq!(record.len(), 10);
        assert_eq!(
            record["referer"],
            Value::Text("http://www.example.com/start.html".to_string())
        );
        assert_eq!(
            record["user_agent"],
            Value::Text("Mozilla/4.08 [en] (Win98; I ;Nav)".to_string())
        );
    }

    #[test]
    fn test_dash_referer_is_omitted() {
        let record = try_parse(
            r#"192.168.1.100 - alice [15/Dec/2023:10:30:45 +0000] "POST /api/login HTTP/1.1" 200 1234 "-" "curl/7.68.0""#,
        )
        .unwrap();

        assert!(!record.contains_key("referer"));
        assert_eq!(record["user_agent"], Value::Text("curl/7.68.0".to_string()));
    }

    #[test]
    fn test_extended_format_with_forwarded_for() {
        let record = try_parse(
            r#"10.10.2.2 - - [20/Sep/2025:23:41:41 +0000] "GET / HTTP/1.1" 200 39689 "-" "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36" "10.10.2.1""#,
        )
        .unwrap();

        assert_eq!(record["forwarded_for"], Value::Text("10.10.2.1".to_string()));
    }

    #[test]
    fn test_dash_forwarded_for_is_omitted() {
        let record = try_parse(
            r#"192.168.1.100 - alice [15/Dec/2023:10:30:45 +0000] "POST /api/login HTTP/1.1" 200 1234 "https://example.com/login" "curl/7.68.0" "-""#,
        )
        .unwrap();

        assert!(!record.contains_key("forwarded_for"));
    }

    #[test]
    fn test_empty_forwarded_for_is_preserved() {
        let record = try_parse(
            r#"10.10.2.2 - - [20/Sep/2025:23:41:41 +0000] "GET / HTTP/1.1" 200 39689 "-" "Mozilla/5.0" """#,
        )
        .unwrap();

        assert_eq!(record["forwarded_for"], Value::Text(String::new()));
    }

    #[test]
    fn test_too_few_tokens_fails() {
        assert_eq!(try_parse("Not an access log"), None);
        assert_eq!(try_parse(r#"a b "GET / HTTP/1.0" 200 5 x"#), None);
    }
}
