//! Query results as JSON rows
//!
//! Rows are vectors of JSON values aligned with an ordered list of column
//! names. Relations are produced from Arrow batches returned by the query
//! engine; all relational work happens in the engine itself.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use arrow::datatypes::Schema;
use arrow::json::writer::{LineDelimited, WriterBuilder};
use arrow::record_batch::RecordBatch;

/// A row of values, aligned with [`Relation::columns`]
pub type Row = Vec<JsonValue>;

/// Ordered columns plus rows of JSON values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relation {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Relation {
    /// Create a relation, checking every row has one value per column
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(Error::RowWidth {
                expected: columns.len(),
                actual: bad.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Convert Arrow batches to rows
    ///
    /// Values go through Arrow's JSON writer, so nested types become JSON
    /// arrays and objects and dates become strings.
    pub fn from_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Self> {
        let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

        let mut writer = WriterBuilder::new()
            .with_explicit_nulls(true)
            .build::<_, LineDelimited>(Vec::new());
        let refs: Vec<&RecordBatch> = batches.iter().collect();
        writer.write_batches(&refs)?;
        writer.finish()?;
        let buffer = writer.into_inner();

        let mut rows = Vec::new();
        for record in serde_json::Deserializer::from_slice(&buffer).into_iter::<JsonObject>() {
            let mut record = record?;
            rows.push(
                columns
                    .iter()
                    .map(|c| record.remove(c).unwrap_or(JsonValue::Null))
                    .collect(),
            );
        }

        Self::new(columns, rows)
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::column_not_found(name, &self.columns))
    }

    /// All values of one column
    pub fn column(&self, name: &str) -> Result<Vec<&JsonValue>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Rows as JSON objects
    pub fn to_records(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let obj: JsonObject = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                JsonValue::Object(obj)
            })
            .collect()
    }

    /// First row whose `column` equals `value`
    pub fn find(&self, column: &str, value: &JsonValue) -> Result<Option<&Row>> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().find(|row| &row[idx] == value))
    }
}
