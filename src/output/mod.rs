//! Output module
//!
//! Turns engine tables into Parquet tables on object storage.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Parquet export settings for DuckDB's `COPY`
//! - Hive-style partition directories
//! - Writing and reading back whole tables

mod partition;
mod table;
mod writer;

pub use partition::{
    escape_partition_value, parse_partition_segment, partition_segment, segment_from_engine,
    segment_to_engine, unescape_partition_value, DEFAULT_PARTITION_NAME,
};
pub use table::{load_table, read_table, TableLocation, TableWriter, WriteSummary, SUCCESS_MARKER};
pub use writer::ParquetOptions;
