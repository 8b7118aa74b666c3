//! The schema evolution writer: binds records to DuckDB tables, creating
//! and widening columns as the data demands.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use duckdb::{params_from_iter, Connection};
use tracing::{debug, warn};

use crate::record::{Record, Value};
use crate::store::error::StoreError;
use crate::store::normalize;
use crate::store::types::ColumnType;

/// A writer over one DuckDB database.
///
/// The connection sits behind a mutex that is held per statement, not per
/// [`write`](Self::write): concurrent writes to the same table may interleave
/// and both attempt the same `ADD COLUMN`, which is why the add path treats
/// "column already exists" as success.
pub struct Writer {
    conn: Mutex<Connection>,
}

impl Writer {
    /// Opens an ephemeral in-memory database.
    pub fn open_memory() -> Result<Writer, StoreError> {
        Ok(Writer {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    /// Opens (or creates) a persistent database at `path`.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Writer, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Writer {
            conn: Mutex::new(conn),
        })
    }

    /// Writes one record into `table`, evolving the schema as needed.
    ///
    /// A record holding nothing besides its `timestamp` is a no-op and does
    /// not create the table. Table and column names are interpolated into
    /// SQL verbatim; callers must supply safe identifiers. Values are always
    /// bound as parameters.
    pub fn write(&self, table: &str, record: Record) -> Result<(), StoreError> {
        if record.len() <= 1 {
            return Ok(());
        }

        let mut columns = self.current_columns(table)?;
        self.ensure_table_exists(table, &mut columns)?;
        let record = normalize::flatten(record);
        self.promote_columns(table, &mut columns, &record)?;
        self.add_missing_columns(table, &columns, &record)?;
        let record = normalize::repair_partial_timestamps(record, &columns);

        debug!(table, fields = record.len(), "inserting row");
        self.insert_row(table, &record)
    }

    /// Closes the underlying connection, reporting any failure.
    pub fn close(self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .into_inner()
            .expect("writer connection poisoned");
        conn.close().map_err(|(_, source)| StoreError::from(source))
    }

    /// Reads the table's current columns from the catalogue.
    fn current_columns(&self, table: &str) -> Result<HashMap<String, ColumnType>, StoreError> {
        const SQL: &str =
            "SELECT column_name, data_type FROM information_schema.columns WHERE table_name = ?";
        let query_error = |source| StoreError::Query {
            sql: SQL.to_string(),
            source,
        };

        let conn = self.conn.lock().expect("writer connection poisoned");
        let mut stmt = conn.prepare(SQL).map_err(query_error)?;
        let rows = stmt
            .query_map([table], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(query_error)?;

        let mut columns = HashMap::new();
        for row in rows {
            let (name, data_type) = row.map_err(query_error)?;
            columns.insert(name, ColumnType::from_sql(&data_type));
        }
        Ok(columns)
    }

    fn ensure_table_exists(
        &self,
        table: &str,
        columns: &mut HashMap<String, ColumnType>,
    ) -> Result<(), StoreError> {
        if !columns.is_empty() {
            return Ok(());
        }
        self.execute_ddl(&format!("CREATE TABLE {table} (timestamp TIMESTAMP)"))?;
        columns.insert("timestamp".to_string(), ColumnType::Timestamp);
        Ok(())
    }

    /// Widens existing columns whose current type does not hold the incoming
    /// value, updating the schema view as it goes.
    fn promote_columns(
        &self,
        table: &str,
        columns: &mut HashMap<String, ColumnType>,
        record: &Record,
    ) -> Result<(), StoreError> {
        for (column, value) in record {
            let Some(&old) = columns.get(column) else {
                continue; // created later by add_missing_columns
            };
            let given = ColumnType::infer(value);
            if given == old {
                continue;
            }
            let resolved = old.promote_to(given)?;
            if resolved == old {
                continue;
            }
            self.promote_column(table, column, old, resolved)?;
            columns.insert(column.clone(), resolved);
        }
        Ok(())
    }

    fn promote_column(
        &self,
        table: &str,
        column: &str,
        old: ColumnType,
        resolved: ColumnType,
    ) -> Result<(), StoreError> {
        // Widening Time to Timestamp borrows the date from the row timestamp
        // column so existing values stay on their original day.
        let sql = if old == ColumnType::Time && resolved == ColumnType::Timestamp {
            format!(
                "ALTER TABLE {table} ALTER COLUMN {column} SET DATA TYPE {resolved} \
                 USING (date_trunc('day', timestamp) + {column}::TIME)"
            )
        } else {
            format!(
                "ALTER TABLE {table} ALTER COLUMN {column} SET DATA TYPE {resolved} \
                 USING TRY_CAST({column} AS {resolved})"
            )
        };
        self.execute_ddl(&sql)
    }

    /// Adds columns for record fields the table does not have yet.
    ///
    /// The schema view is left untouched: timestamp repair only applies to
    /// columns that were Timestamp-typed before this write.
    fn add_missing_columns(
        &self,
        table: &str,
        columns: &HashMap<String, ColumnType>,
        record: &Record,
    ) -> Result<(), StoreError> {
        for (column, value) in record {
            if columns.contains_key(column) {
                continue;
            }
            let inferred = ColumnType::infer(value);
            if inferred == ColumnType::JsonMap {
                // An object surviving to this point expands into one column
                // per leaf key.
                for (name, leaf_type) in object_leaf_columns(column, value) {
                    self.add_column(table, &name, leaf_type)?;
                }
            } else {
                self.add_column(table, column, inferred)?;
            }
        }
        Ok(())
    }

    fn add_column(
        &self,
        table: &str,
        column: &str,
        column_type: ColumnType,
    ) -> Result<(), StoreError> {
        let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {column_type}");
        match self.execute_ddl(&sql) {
            Err(StoreError::SchemaMutation { ref source, .. }) if is_already_exists(source) => {
                warn!(table, column, "column already added by a concurrent writer");
                Ok(())
            }
            other => other,
        }
    }

    fn insert_row(&self, table: &str, record: &Record) -> Result<(), StoreError> {
        let mut columns = String::new();
        let mut placeholders = String::new();
        let mut values = Vec::with_capacity(record.len());
        for (column, value) in record {
            if !columns.is_empty() {
                columns.push_str(", ");
                placeholders.push_str(", ");
            }
            columns.push_str(column);
            placeholders.push('?');
            values.push(bind_value(value));
        }

        let sql = format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})");
        let conn = self.conn.lock().expect("writer connection poisoned");
        conn.execute(&sql, params_from_iter(values.iter()))
            .map_err(|source| StoreError::Insert {
                table: table.to_string(),
                summary: format!("{columns}: {values:?}"),
                source,
            })?;
        Ok(())
    }

    fn execute_ddl(&self, sql: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("writer connection poisoned");
        conn.execute_batch(sql).map_err(|source| StoreError::SchemaMutation {
            sql: sql.to_string(),
            source,
        })
    }
}

/// One column per leaf key of an object value, `parent_child` named.
fn object_leaf_columns(parent: &str, value: &Value) -> Vec<(String, ColumnType)> {
    let Value::Object(record) = value else {
        return Vec::new();
    };
    record
        .iter()
        .map(|(key, child)| (format!("{parent}_{key}"), ColumnType::infer(child)))
        .collect()
}

fn bind_value(value: &Value) -> duckdb::types::Value {
    use duckdb::types::{TimeUnit, Value as SqlValue};
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Boolean(*b),
        Value::Int(i) => SqlValue::BigInt(*i),
        Value::Float(f) => SqlValue::Double(*f),
        Value::Timestamp(ts) => SqlValue::Timestamp(TimeUnit::Microsecond, ts.timestamp_micros()),
        Value::Text(s) | Value::Json(s) => SqlValue::Text(s.clone()),
        // Structural values are normalised away before insert; if one slips
        // through it binds as its JSON rendering.
        Value::Array(items) => SqlValue::Text(
            serde_json::to_string(items).unwrap_or_else(|_| format!("{items:?}")),
        ),
        Value::Object(record) => SqlValue::Text(
            serde_json::to_string(record).unwrap_or_else(|_| format!("{record:?}")),
        ),
    }
}

fn is_already_exists(error: &duckdb::Error) -> bool {
    error.to_string().to_ascii_lowercase().contains("already exists")
}
