//! Error types for sparkify-lake
//!
//! This module defines the error hierarchy for the whole job.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for sparkify-lake
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Invalid storage URL: {url}")]
    InvalidUrl { url: String },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Invalid object path: {0}")]
    ObjectPath(#[from] object_store::path::Error),

    #[error("Invalid glob pattern '{pattern}': {message}")]
    Glob { pattern: String, message: String },

    // ============================================================================
    // Input Errors
    // ============================================================================
    #[error("No input files match '{pattern}'")]
    NoInputFiles { pattern: String },

    #[error("Malformed record in {path} at line {line}: {message}")]
    MalformedRecord {
        path: String,
        line: usize,
        message: String,
    },

    // ============================================================================
    // Query Engine Errors
    // ============================================================================
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Column '{column}' not found (available: {available})")]
    ColumnNotFound { column: String, available: String },

    #[error("Row has {actual} values but relation has {expected} columns")]
    RowWidth { expected: usize, actual: usize },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    // ============================================================================
    // Output Errors
    // ============================================================================
    #[error("Output error: {message}")]
    Output { message: String },

    #[error("Table already exists at {location}")]
    TableExists { location: String },

    #[error("Table at {location} contains no data files")]
    EmptyTable { location: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a column-not-found error listing the columns in scope
    pub fn column_not_found(column: impl Into<String>, available: &[String]) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
            available: available.join(", "),
        }
    }

    /// Check if this error comes from reading input rather than the job itself
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::NoInputFiles { .. } | Error::MalformedRecord { .. } | Error::EmptyTable { .. }
        )
    }
}

/// Result type alias for sparkify-lake
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
