//! Query engine via DuckDB
//!
//! Every table derivation (projection, deduplication, joins, generated
//! ids, timestamp arithmetic) and every Parquet export runs inside DuckDB.
//! Object storage stays outside: records and Parquet files are moved
//! between the store and the engine's local scratch directory.

mod connection;
mod sql;

pub use connection::Engine;
pub use sql::{column_list, quote_ident, quote_literal, select_distinct};
