//! Store-facing error type.

use std::path::PathBuf;

use thiserror::Error;

use super::types::ColumnType;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A catalogue or data query failed.
    #[error("query failed: {sql}: {source}")]
    Query {
        sql: String,
        #[source]
        source: duckdb::Error,
    },

    /// A `CREATE TABLE` / `ALTER TABLE` statement failed. "column already
    /// exists" on ADD COLUMN is masked before this surfaces.
    #[error("schema change failed: {sql}: {source}")]
    SchemaMutation {
        sql: String,
        #[source]
        source: duckdb::Error,
    },

    /// A row insert failed; `summary` carries the bound column names and
    /// values so the caller can decide what to log.
    #[error("insert into {table} failed ({summary}): {source}")]
    Insert {
        table: String,
        summary: String,
        #[source]
        source: duckdb::Error,
    },

    /// The promotion lattice was asked about a sentinel type. The lattice is
    /// total over the value-carrying types, so this indicates a bug.
    #[error("no promotion from {old} given {given}")]
    PromotionUnresolved { old: ColumnType, given: ColumnType },

    /// The parent directory for a persistent store could not be created.
    #[error("failed to create store directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Opening the store at `path` failed.
    #[error("failed to open store {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: duckdb::Error,
    },

    /// Driver-level connection failure (open in memory, close).
    #[error(transparent)]
    Connection(#[from] duckdb::Error),
}
