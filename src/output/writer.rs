//! Parquet export settings
//!
//! Rendered as the option list of DuckDB's `COPY ... TO` statement.

use crate::engine::column_list;
use crate::types::CompressionCodec;

/// Settings for Parquet part files
#[derive(Debug, Clone, Default)]
pub struct ParquetOptions {
    compression: CompressionCodec,
    row_group_size: Option<usize>,
}

impl ParquetOptions {
    /// Create options with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression codec
    #[must_use]
    pub fn with_compression(mut self, compression: CompressionCodec) -> Self {
        self.compression = compression;
        self
    }

    /// Set rows per row group; DuckDB's default when `None`
    #[must_use]
    pub fn with_row_group_size(mut self, size: Option<usize>) -> Self {
        self.row_group_size = size.filter(|s| *s > 0);
        self
    }

    /// Get compression codec
    pub fn compression(&self) -> CompressionCodec {
        self.compression
    }

    /// Get row group size
    pub fn row_group_size(&self) -> Option<usize> {
        self.row_group_size
    }

    /// `COPY` option list, partitioned by `partition_by` when non-empty
    pub fn copy_options<S: AsRef<str>>(&self, partition_by: &[S]) -> String {
        let mut options = vec![
            "FORMAT PARQUET".to_string(),
            format!("COMPRESSION '{}'", self.compression.as_sql()),
        ];
        if let Some(size) = self.row_group_size {
            options.push(format!("ROW_GROUP_SIZE {size}"));
        }
        if !partition_by.is_empty() {
            options.push(format!("PARTITION_BY ({})", column_list(partition_by)));
        }
        options.join(", ")
    }
}
