//! Schema-evolving ingestion of semi-structured log lines into DuckDB.
//!
//! A raw line of text runs through a cascaded format parser (JSON, syslog,
//! Apache access logs, logfmt, Monolog) into a typed [`Record`]; the caller
//! attaches a row timestamp and hands the record to a [`Writer`], which
//! creates the target table on demand, flattens nested objects into
//! underscore-joined columns, infers a column type per value, widens
//! existing columns through a promotion lattice when new values no longer
//! fit, and finally inserts the row.
//!
//! ```no_run
//! use chrono::Utc;
//! use loglake::{parse, record_with_timestamp, Writer};
//!
//! # fn main() -> Result<(), loglake::StoreError> {
//! let writer = Writer::open_memory()?;
//! let record = parse(r#"{"level": "info", "user": {"id": 42}}"#);
//! writer.write("events", record_with_timestamp(Utc::now(), record))?;
//! # Ok(())
//! # }
//! ```
//!
//! Long-lived processes share writers through the process-wide
//! [`registry`], which guarantees one connection per database path.

pub mod parser;
pub mod record;
pub mod store;

pub use parser::parse;
pub use record::{record_with_timestamp, Record, Value};
pub use store::{registry, ColumnType, ConnectionRegistry, StoreError, Writer};
