//! Partitioned table writer and reader
//!
//! Layout of a table with `partition_by = [year, month]`:
//!
//! ```text
//! time_table/
//!   year=2018/month=11/part-00000-<run>.c000.snappy.parquet
//!   _SUCCESS
//! ```
//!
//! Partition columns live in directory names only. DuckDB writes the part
//! files into its scratch directory; they are then renamed and uploaded.

use super::partition::{parse_partition_segment, segment_from_engine, segment_to_engine};
use super::writer::ParquetOptions;
use crate::config::AwsConfig;
use crate::engine::{column_list, quote_ident, Engine};
use crate::error::{Error, Result, ResultExt};
use crate::frame::Relation;
use crate::storage::Storage;
use crate::types::SaveMode;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Marker written after every part file of a table
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Where a table lives: a storage rooted at the table directory
#[derive(Debug, Clone)]
pub struct TableLocation {
    storage: Storage,
    name: String,
}

impl TableLocation {
    /// Table `name` directly below `root`
    pub fn new(root: &Storage, name: &str) -> Result<Self> {
        Ok(Self {
            storage: root.child(name)?,
            name: name.to_string(),
        })
    }

    /// Table at a full URL; the last path segment is the table name
    pub fn parse(url: &str, aws: &AwsConfig) -> Result<Self> {
        let trimmed = url.trim_end_matches('/');
        let name = trimmed
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty() && !n.ends_with(':'))
            .ok_or_else(|| Error::InvalidUrl {
                url: url.to_string(),
            })?;
        Ok(Self {
            storage: Storage::parse(trimmed, aws)?,
            name: name.to_string(),
        })
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full URL of the table directory
    pub fn url(&self) -> String {
        self.storage.root_url()
    }

    /// Storage rooted at the table directory
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl std::fmt::Display for TableLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url())
    }
}

/// Result of writing one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Table name
    pub table: String,
    /// Table URL
    pub location: String,
    /// Rows written
    pub rows: usize,
    /// Part files written
    pub files: usize,
    /// Distinct partition directories
    pub partitions: usize,
    /// Whether the write was skipped because data already existed
    pub skipped: bool,
}

/// Hidden partition column splitting partitions into bounded files
const FILE_CHUNK_COLUMN: &str = "__file_chunk";

/// Writes engine tables as (optionally partitioned) Parquet tables
#[derive(Debug, Clone)]
pub struct TableWriter {
    parquet: ParquetOptions,
    mode: SaveMode,
    max_rows_per_file: Option<usize>,
    run_id: String,
}

impl TableWriter {
    /// Create a writer; `run_id` goes into every part file name
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            parquet: ParquetOptions::default(),
            mode: SaveMode::default(),
            max_rows_per_file: None,
            run_id: run_id.into(),
        }
    }

    /// Set Parquet settings
    #[must_use]
    pub fn with_parquet_options(mut self, options: ParquetOptions) -> Self {
        self.parquet = options;
        self
    }

    /// Set the save mode
    #[must_use]
    pub fn with_mode(mut self, mode: SaveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Split partitions into files of at most `max` rows
    #[must_use]
    pub fn with_max_rows_per_file(mut self, max: Option<usize>) -> Self {
        self.max_rows_per_file = max.filter(|m| *m > 0);
        self
    }

    /// The save mode
    pub fn mode(&self) -> SaveMode {
        self.mode
    }

    /// Write engine table `table` to `location`, partitioned by `partition_by`
    pub async fn write(
        &self,
        engine: &Engine,
        table: &str,
        location: &TableLocation,
        partition_by: &[&str],
    ) -> Result<WriteSummary> {
        engine.require_columns(table, partition_by)?;

        let storage = location.storage();
        if storage.exists_prefix("").await? {
            match self.mode {
                SaveMode::ErrorIfExists => {
                    return Err(Error::TableExists {
                        location: location.url(),
                    });
                }
                SaveMode::Ignore => {
                    tracing::info!("Table {} exists, skipping write", location);
                    return Ok(WriteSummary {
                        table: location.name().to_string(),
                        location: location.url(),
                        rows: 0,
                        files: 0,
                        partitions: 0,
                        skipped: true,
                    });
                }
                SaveMode::Overwrite => {
                    let removed = storage.delete_prefix("").await?;
                    tracing::debug!("Removed {} existing objects under {}", removed, location);
                }
            }
        }

        let rows = engine.row_count(table)?;
        let mut files = 0;
        let mut partitions = BTreeSet::new();

        if rows > 0 {
            let scratch = engine.scratch_path(table);
            let exported = self.export(engine, table, partition_by, &scratch);
            let uploaded = match exported {
                Ok(local) => self.upload(&scratch, &local, storage).await,
                Err(e) => Err(e),
            };
            let _ = std::fs::remove_dir_all(&scratch);
            for (dir, url) in uploaded? {
                tracing::debug!("Wrote {}", url);
                if !partition_by.is_empty() {
                    partitions.insert(dir);
                }
                files += 1;
            }
        }

        storage
            .put(&ObjectPath::parse(SUCCESS_MARKER)?, Bytes::new())
            .await?;

        let summary = WriteSummary {
            table: location.name().to_string(),
            location: location.url(),
            rows,
            files,
            partitions: partitions.len(),
            skipped: false,
        };
        tracing::info!(
            "Wrote table {} ({} rows, {} files, {} partitions) to {}",
            summary.table,
            summary.rows,
            summary.files,
            summary.partitions,
            summary.location
        );
        Ok(summary)
    }

    /// `COPY` the table into `scratch`, returning the Parquet files written
    fn export(
        &self,
        engine: &Engine,
        table: &str,
        partition_by: &[&str],
        scratch: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut copy_partitions: Vec<&str> = partition_by.to_vec();
        let query = match self.max_rows_per_file {
            Some(max) => {
                let data_columns: Vec<String> = engine
                    .columns(table)?
                    .into_iter()
                    .filter(|c| !partition_by.iter().any(|p| p.eq_ignore_ascii_case(c)))
                    .collect();
                let mut window = Vec::new();
                if !partition_by.is_empty() {
                    window.push(format!("PARTITION BY {}", column_list(partition_by)));
                }
                if !data_columns.is_empty() {
                    window.push(format!("ORDER BY {}", column_list(&data_columns)));
                }
                copy_partitions.push(FILE_CHUNK_COLUMN);
                format!(
                    "SELECT *, (row_number() OVER ({}) - 1) // {max} AS {} FROM {}",
                    window.join(" "),
                    quote_ident(FILE_CHUNK_COLUMN),
                    quote_ident(table)
                )
            }
            None => format!("SELECT * FROM {} ORDER BY ALL", quote_ident(table)),
        };

        let options = self.parquet.copy_options(&copy_partitions);
        if copy_partitions.is_empty() {
            std::fs::create_dir_all(scratch)?;
            engine.copy_to_parquet(&query, &scratch.join("data_0.parquet"), &options)?;
        } else {
            engine.copy_to_parquet(&query, scratch, &options)?;
        }

        list_parquet_files(scratch)
    }

    /// Upload exported files under their table directory, returning
    /// `(partition directory, url)` per part file
    async fn upload(
        &self,
        scratch: &Path,
        local: &[PathBuf],
        storage: &Storage,
    ) -> Result<Vec<(String, String)>> {
        let mut uploaded = Vec::with_capacity(local.len());
        for (index, file) in local.iter().enumerate() {
            let relative = file.strip_prefix(scratch).map_err(|_| {
                Error::output(format!("Unexpected export file {}", file.display()))
            })?;
            let dir = relative
                .parent()
                .into_iter()
                .flat_map(Path::components)
                .filter_map(|c| c.as_os_str().to_str())
                .filter(|segment| !segment.starts_with(FILE_CHUNK_COLUMN))
                .filter_map(segment_from_engine)
                .collect::<Vec<_>>()
                .join("/");

            let file_name = self.part_file_name(index);
            let path = if dir.is_empty() {
                file_name
            } else {
                format!("{dir}/{file_name}")
            };
            let bytes = std::fs::read(file)?;
            let url = storage.put(&ObjectPath::parse(&path)?, Bytes::from(bytes)).await?;
            uploaded.push((dir, url));
        }
        Ok(uploaded)
    }

    fn part_file_name(&self, index: usize) -> String {
        match self.parquet.compression().file_infix() {
            Some(infix) => format!("part-{index:05}-{}.c000.{infix}.parquet", self.run_id),
            None => format!("part-{index:05}-{}.c000.parquet", self.run_id),
        }
    }
}

/// Every `.parquet` file below `dir`, sorted
fn list_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*.parquet", glob::Pattern::escape(&dir.to_string_lossy()));
    let glob_error = |message: String| Error::Glob {
        pattern: pattern.clone(),
        message,
    };
    let mut files = glob::glob(&pattern)
        .map_err(|e| glob_error(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| glob_error(e.to_string()))?;
    files.sort();
    Ok(files)
}

/// Load a table written by [`TableWriter`] into engine table `table`
///
/// Partition columns are restored from directory names and appended after
/// the file columns. A table without data files is an error.
pub async fn load_table(engine: &Engine, location: &TableLocation, table: &str) -> Result<usize> {
    let storage = location.storage();
    let files: Vec<ObjectPath> = storage
        .list("")
        .await?
        .into_iter()
        .filter(is_data_file)
        .collect();

    if files.is_empty() {
        return Err(Error::EmptyTable {
            location: location.url(),
        });
    }

    let scratch = engine.scratch_path(table);
    let mut partition_columns: Option<Vec<String>> = None;
    let mut local = Vec::with_capacity(files.len());

    for file in &files {
        let parts: Vec<&str> = file.as_ref().split('/').collect();
        let (file_name, dirs) = parts
            .split_last()
            .ok_or_else(|| Error::output(format!("Empty object path under {location}")))?;
        let names: Vec<String> = dirs
            .iter()
            .filter_map(|segment| parse_partition_segment(segment))
            .map(|(name, _)| name)
            .collect();

        match &partition_columns {
            None => partition_columns = Some(names),
            Some(existing) if *existing != names => {
                let _ = std::fs::remove_dir_all(&scratch);
                return Err(Error::output(format!(
                    "Inconsistent partition layout in {}: expected {:?}, found {:?} in {}",
                    location, existing, names, file
                )));
            }
            Some(_) => {}
        }

        let mut path = scratch.clone();
        path.extend(dirs.iter().filter_map(|segment| segment_to_engine(segment)));
        std::fs::create_dir_all(&path)?;
        path.push(file_name);

        let bytes = storage.get(file).await?;
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to stage {}", storage.url_for(file.as_ref())))?;
        local.push(path);
    }

    let rows = engine.load_parquet(table, &local);
    let _ = std::fs::remove_dir_all(&scratch);
    let rows = rows.with_context(|| format!("Failed to read table {location}"))?;

    tracing::info!(
        "Read table {} ({} rows, {} files)",
        location,
        rows,
        files.len()
    );
    Ok(rows)
}

/// Read a table written by [`TableWriter`] into memory, rows sorted
pub async fn read_table(location: &TableLocation) -> Result<Relation> {
    let engine = Engine::new()?;
    load_table(&engine, location, location.name()).await?;
    engine.query(&format!(
        "SELECT * FROM {} ORDER BY ALL",
        quote_ident(location.name())
    ))
}

/// Parquet part files, skipping `_SUCCESS` and hidden entries
fn is_data_file(path: &ObjectPath) -> bool {
    let Some(file_name) = path.filename() else {
        return false;
    };
    std::path::Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"))
        && path
            .parts()
            .all(|part| !part.as_ref().starts_with(['_', '.']))
}
