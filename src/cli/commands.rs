//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sparkify data lake ETL
#[derive(Parser, Debug)]
#[command(name = "sparkify-lake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); missing file means defaults
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Input root holding song_data/ and log_data/
    /// Supports: /path, s3://bucket/path, s3a://bucket/path, gs://bucket/path, az://container/path
    #[arg(short, long, global = true)]
    pub input: Option<String>,

    /// Output root the tables are written under
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run both stages (default)
    Run,

    /// Build the songs and artists tables
    SongData,

    /// Build the users, time and songplays tables
    LogData {
        /// Songs table to join against (default: <output>/songs_table)
        #[arg(long)]
        songs_table: Option<String>,
    },

    /// Print the effective configuration with secrets masked
    Config,
}

impl Cli {
    /// The subcommand, defaulting to `run`
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}
