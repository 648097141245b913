//! Job configuration
//!
//! Loaded once at start-up from an optional YAML file and then passed
//! explicitly to the session. Nothing here touches the process environment.

use crate::error::{Error, Result};
use crate::types::{CompressionCodec, ReadMode, SaveMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "dl.yaml";

/// Default input root
pub const DEFAULT_INPUT: &str = "s3a://udacity-dend/";

/// Default output root
pub const DEFAULT_OUTPUT: &str = "s3a://udacity-ag-bucket1/";

/// Default song metadata glob, relative to the input root
pub const DEFAULT_SONG_DATA_GLOB: &str = "song_data/*/*/*/*.json";

/// Default event log glob, relative to the input root
pub const DEFAULT_LOG_DATA_GLOB: &str = "log_data/*/*/*.json";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete job configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Object storage credentials
    pub aws: AwsConfig,

    /// Input and output locations
    pub paths: PathsConfig,

    /// Session settings
    pub session: SessionConfig,

    /// JSON reader settings
    pub read: ReadConfig,

    /// Parquet writer settings
    pub write: WriteConfig,
}

impl EtlConfig {
    /// Parse a config from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// Load a config file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Override the input root
    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.paths.input = input.into();
        self
    }

    /// Override the output root
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.paths.output = output.into();
        self
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.paths.input.trim().is_empty() {
            return Err(Error::invalid_value("paths.input", "must not be empty"));
        }
        if self.paths.output.trim().is_empty() {
            return Err(Error::invalid_value("paths.output", "must not be empty"));
        }
        for (field, pattern) in [
            ("paths.song_data", &self.paths.song_data),
            ("paths.log_data", &self.paths.log_data),
        ] {
            glob::Pattern::new(pattern)
                .map_err(|e| Error::invalid_value(field, e.to_string()))?;
        }
        // chrono only accepts offsets strictly inside +/- 24h
        if self.session.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(Error::invalid_value(
                "session.utc_offset_minutes",
                "must be within +/- 1439",
            ));
        }
        for (field, value) in [
            ("write.max_rows_per_file", self.write.max_rows_per_file),
            ("write.row_group_size", self.write.row_group_size),
        ] {
            if value == Some(0) {
                return Err(Error::invalid_value(field, "must be greater than zero"));
            }
        }
        Ok(())
    }

    /// Copy of the config safe to print
    #[must_use]
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        if masked.aws.secret_access_key.is_some() {
            masked.aws.secret_access_key = Some("****".to_string());
        }
        masked
    }
}

// ============================================================================
// AWS
// ============================================================================

/// S3 credentials and endpoint
///
/// Unset fields fall back to the standard `AWS_*` environment lookup
/// performed by the S3 client builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint (MinIO, R2, localstack)
    pub endpoint: Option<String>,
}

// ============================================================================
// Paths
// ============================================================================

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root the input globs are resolved against
    pub input: String,
    /// Root the five tables are written under
    pub output: String,
    /// Song metadata glob, relative to `input`
    pub song_data: String,
    /// Event log glob, relative to `input`
    pub log_data: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT.to_string(),
            output: DEFAULT_OUTPUT.to_string(),
            song_data: DEFAULT_SONG_DATA_GLOB.to_string(),
            log_data: DEFAULT_LOG_DATA_GLOB.to_string(),
        }
    }
}

// ============================================================================
// Session / Read / Write
// ============================================================================

/// Session settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Offset from UTC used when rendering event timestamps
    pub utc_offset_minutes: i32,
}

/// JSON reader settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    pub mode: ReadMode,
}

/// Parquet writer settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    pub mode: SaveMode,
    pub compression: CompressionCodec,
    /// Split partitions into several part files above this many rows
    pub max_rows_per_file: Option<usize>,
    /// Rows per Parquet row group; DuckDB's default when unset
    pub row_group_size: Option<usize>,
}
