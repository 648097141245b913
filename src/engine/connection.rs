//! DuckDB-backed query engine
//!
//! One in-memory DuckDB database per run. JSON records are staged as
//! newline-delimited files in a scratch directory and loaded with
//! `read_json_auto`, which infers one type per column. Tables are derived
//! with SQL and exported with `COPY ... (FORMAT PARQUET)`.

use super::sql::{quote_ident, quote_literal};
use crate::error::{Error, Result};
use crate::frame::Relation;
use crate::source::CORRUPT_RECORD_COLUMN;
use crate::types::JsonValue;
use arrow::record_batch::RecordBatch;
use duckdb::Connection;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

/// Query engine over an in-memory DuckDB connection
pub struct Engine {
    /// DuckDB connection
    conn: Mutex<Connection>,
    /// Staged JSON and Parquet files; removed when the engine is dropped
    scratch: TempDir,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Engine<{}>", self.scratch.path().display())
    }
}

impl Engine {
    /// Open an in-memory database with its own scratch directory
    pub fn new() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;
        let scratch = tempfile::Builder::new()
            .prefix("sparkify-lake-")
            .tempdir()?;
        tracing::debug!("DuckDB scratch space at {}", scratch.path().display());

        Ok(Self {
            conn: Mutex::new(conn),
            scratch,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Other("DuckDB connection lock poisoned".to_string()))
    }

    /// A fresh, not yet existing path in the scratch directory
    pub fn scratch_path(&self, label: &str) -> PathBuf {
        self.scratch
            .path()
            .join(format!("{label}-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Run one or more statements
    pub fn execute(&self, sql: &str) -> Result<()> {
        tracing::debug!("Executing: {}", sql);
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    /// Replace `table` with the result of `query`, returning its row count
    pub fn create_table(&self, table: &str, query: &str) -> Result<usize> {
        self.execute(&format!(
            "CREATE OR REPLACE TABLE {} AS {query}",
            quote_ident(table)
        ))?;
        self.row_count(table)
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT count(*) FROM {}", quote_ident(table));
        let count: i64 = self.conn()?.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Column names of a table, in order; empty if the table does not exist
    pub fn columns(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT column_name FROM information_schema.columns
             WHERE table_name = ? ORDER BY ordinal_position",
        )?;
        let columns = stmt
            .query_map(duckdb::params![table], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// Fail with [`Error::ColumnNotFound`] unless `table` has every column
    ///
    /// Names compare case-insensitively, like DuckDB identifiers.
    pub fn require_columns(&self, table: &str, required: &[&str]) -> Result<()> {
        let available = self.columns(table)?;
        match required
            .iter()
            .find(|r| !available.iter().any(|c| c.eq_ignore_ascii_case(r)))
        {
            Some(missing) => Err(Error::column_not_found(*missing, &available)),
            None => Ok(()),
        }
    }

    /// Run a query and materialize the result
    pub fn query(&self, sql: &str) -> Result<Relation> {
        tracing::debug!("Querying: {}", sql);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let arrow = stmt.query_arrow([])?;
        let schema = arrow.get_schema();
        let batches: Vec<RecordBatch> = arrow.collect();
        Relation::from_batches(&schema, &batches)
    }

    /// Load JSON objects into `table`, returning the row count
    ///
    /// Column types are inferred over every record: integers mixed with
    /// floats become `DOUBLE`, other mixtures become text. Without records
    /// the table holds only the corrupt-record column.
    pub fn load_json_records(&self, table: &str, records: &[JsonValue]) -> Result<usize> {
        if records.is_empty() {
            self.execute(&format!(
                "CREATE OR REPLACE TABLE {} ({} VARCHAR)",
                quote_ident(table),
                quote_ident(CORRUPT_RECORD_COLUMN)
            ))?;
            return Ok(0);
        }

        let path = self.scratch_path(table).with_extension("json");
        let mut out = BufWriter::new(File::create(&path)?);
        for record in records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        drop(out);

        let query = format!(
            "SELECT * FROM read_json_auto({}, format = 'newline_delimited', records = 'true', sample_size = -1)",
            quote_literal(path_str(&path)?)
        );
        let rows = self.create_table(table, &query);
        let _ = std::fs::remove_file(&path);
        rows
    }

    /// Export a query as Parquet to a local file or directory
    ///
    /// `options` is the body of the `COPY` options list.
    pub fn copy_to_parquet(&self, query: &str, target: &Path, options: &str) -> Result<()> {
        self.execute(&format!(
            "COPY ({query}) TO {} ({options})",
            quote_literal(path_str(target)?)
        ))
    }

    /// Load local Parquet files into `table`, returning the row count
    ///
    /// Hive `col=value` directories become trailing columns.
    pub fn load_parquet(&self, table: &str, files: &[PathBuf]) -> Result<usize> {
        let list = files
            .iter()
            .map(|f| path_str(f).map(quote_literal))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        self.create_table(
            table,
            &format!(
                "SELECT * FROM read_parquet([{list}], hive_partitioning = true, union_by_name = true)"
            ),
        )
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::config(format!("Non UTF-8 scratch path: {}", path.display())))
}
