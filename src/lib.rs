// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Sparkify Lake
//!
//! Batch ETL that turns the Sparkify song metadata and event log JSON
//! datasets into a star schema of partitioned Parquet tables.
//!
//! ## Tables
//!
//! | Table | Partitioned by |
//! |---|---|
//! | `songs_table` | year, artist_id |
//! | `artists_table` | |
//! | `user_table` | |
//! | `time_table` | year, month |
//! | `songplays_table` | year, month |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sparkify_lake::{run_pipeline, EtlConfig, Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = EtlConfig::load_or_default("dl.yaml")?
//!         .with_input("s3a://udacity-dend/")
//!         .with_output("/tmp/lake");
//!
//!     let session = Session::new(config)?;
//!     let output = run_pipeline(&session).await?;
//!     for summary in output.summaries() {
//!         println!("{} rows -> {}", summary.rows, summary.location);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                       etl::run_pipeline                        │
//! │  process_song_data ──(songs TableLocation)──▶ process_log_data │
//! └────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────────┼───────────────┬───────────────┐
//! │  Session   │     Source      │    Engine     │    Output     │
//! ├────────────┼─────────────────┼───────────────┼───────────────┤
//! │ Config     │ Path globs      │ DuckDB        │ COPY Parquet  │
//! │ Storage    │ JSON Lines      │ read_json     │ Hive layout   │
//! │ Time zone  │ Corrupt records │ SQL tables    │ Upload        │
//! │ Run id     │                 │ Arrow results │ Read-back     │
//! └────────────┴─────────────────┴───────────────┴───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Job configuration
pub mod config;

/// Object storage roots
pub mod storage;

/// DuckDB query engine
pub mod engine;

/// Materialized query results
pub mod frame;

/// JSON input
pub mod source;

/// Parquet table output
pub mod output;

/// Shared run context
pub mod session;

/// Song-data and log-data stages
pub mod etl;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::EtlConfig;
pub use engine::Engine;
pub use etl::{process_log_data, process_song_data, run_pipeline, PipelineOutput};
pub use frame::Relation;
pub use output::{read_table, TableLocation, WriteSummary};
pub use session::Session;
pub use storage::Storage;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
