//! Common types used throughout sparkify-lake
//!
//! This module contains shared type definitions, type aliases,
//! and small enums used by configuration, the JSON source and the
//! Parquet output.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Read Mode
// ============================================================================

/// How the JSON source treats lines that fail to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Keep a row of nulls and the raw text in `_corrupt_record`
    #[default]
    Permissive,
    /// Skip malformed lines with a warning
    DropMalformed,
    /// Abort on the first malformed line
    FailFast,
}

// ============================================================================
// Save Mode
// ============================================================================

/// What a table write does when the destination already holds data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// Delete whatever is under the table prefix, then write
    #[default]
    Overwrite,
    /// Fail if anything exists under the table prefix
    ErrorIfExists,
    /// Leave existing data alone and skip the write
    Ignore,
}

// ============================================================================
// Compression
// ============================================================================

/// Parquet compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionCodec {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    None,
}

impl CompressionCodec {
    /// Codec name in a DuckDB `COPY ... (COMPRESSION ...)` clause
    pub fn as_sql(self) -> &'static str {
        match self {
            CompressionCodec::Snappy => "snappy",
            CompressionCodec::Zstd => "zstd",
            CompressionCodec::Gzip => "gzip",
            CompressionCodec::None => "uncompressed",
        }
    }

    /// File name infix, e.g. `part-00000-<run>.c000.snappy.parquet`
    pub fn file_infix(self) -> Option<&'static str> {
        match self {
            CompressionCodec::Snappy => Some("snappy"),
            CompressionCodec::Zstd => Some("zstd"),
            CompressionCodec::Gzip => Some("gz"),
            CompressionCodec::None => None,
        }
    }
}
