//! CLI module
//!
//! Command-line interface for running the ETL.
//!
//! # Commands
//!
//! - `run` - Both stages (default)
//! - `song-data` - Songs and artists tables
//! - `log-data` - Users, time and songplays tables
//! - `config` - Print the effective configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{write_summaries, Runner};
