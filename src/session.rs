//! ETL session
//!
//! Everything the stages share: input and output storage, the query
//! engine, the JSON reader, the table writer, the session time zone and
//! the run identifier.

use crate::config::EtlConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::output::{ParquetOptions, TableLocation, TableWriter};
use crate::source::{JsonReader, PathGlob};
use crate::storage::Storage;
use chrono::FixedOffset;
use std::sync::Arc;

/// Shared context for one ETL run
#[derive(Debug, Clone)]
pub struct Session {
    config: EtlConfig,
    input: Storage,
    output: Storage,
    engine: Arc<Engine>,
    reader: JsonReader,
    writer: TableWriter,
    offset: FixedOffset,
    run_id: String,
}

impl Session {
    /// Open input and output storage from configuration
    ///
    /// Credentials go straight into the storage clients; the process
    /// environment is left untouched.
    pub fn new(config: EtlConfig) -> Result<Self> {
        config.validate()?;
        let input = Storage::parse(&config.paths.input, &config.aws)?;
        let output = Storage::parse(&config.paths.output, &config.aws)?;
        Self::with_storage(config, input, output)
    }

    /// Build a session over storage opened by the caller
    pub fn with_storage(config: EtlConfig, input: Storage, output: Storage) -> Result<Self> {
        config.validate()?;

        let offset = FixedOffset::east_opt(config.session.utc_offset_minutes * 60).ok_or_else(
            || {
                Error::invalid_value(
                    "session.utc_offset_minutes",
                    format!("{} is out of range", config.session.utc_offset_minutes),
                )
            },
        )?;

        let run_id = uuid::Uuid::new_v4().to_string();
        let parquet = ParquetOptions::new()
            .with_compression(config.write.compression)
            .with_row_group_size(config.write.row_group_size);
        let writer = TableWriter::new(run_id.clone())
            .with_parquet_options(parquet)
            .with_mode(config.write.mode)
            .with_max_rows_per_file(config.write.max_rows_per_file);

        tracing::debug!(
            "Session {} reading {} writing {}",
            run_id,
            input.root_url(),
            output.root_url()
        );

        Ok(Self {
            engine: Arc::new(Engine::new()?),
            reader: JsonReader::new(config.read.mode),
            config,
            input,
            output,
            writer,
            offset,
            run_id,
        })
    }

    /// Effective configuration
    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Root the raw datasets are read from
    pub fn input(&self) -> &Storage {
        &self.input
    }

    /// Root the tables are written under
    pub fn output(&self) -> &Storage {
        &self.output
    }

    /// Query engine holding the staged and derived tables
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn reader(&self) -> &JsonReader {
        &self.reader
    }

    pub fn writer(&self) -> &TableWriter {
        &self.writer
    }

    /// Session time zone used when formatting timestamps
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Identifier of this run, embedded in part file names
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Glob of the song metadata files, relative to the input root
    pub fn song_data_glob(&self) -> Result<PathGlob> {
        PathGlob::new(&self.config.paths.song_data)
    }

    /// Glob of the event log files, relative to the input root
    pub fn log_data_glob(&self) -> Result<PathGlob> {
        PathGlob::new(&self.config.paths.log_data)
    }

    /// Location of a table below the output root
    pub fn table(&self, name: &str) -> Result<TableLocation> {
        TableLocation::new(&self.output, name)
    }
}
