//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{EtlConfig, DEFAULT_CONFIG_PATH};
use crate::error::Result;
use crate::etl::tables::SONGS_TABLE;
use crate::etl::{process_log_data, process_song_data, run_pipeline};
use crate::output::{TableLocation, WriteSummary};
use crate::session::Session;
use std::io::Write;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        if self.cli.command() == Commands::Config {
            print!("{}", serde_yaml::to_string(&config.masked())?);
            return Ok(());
        }

        let summaries = self.execute(config).await?;
        write_summaries(&mut std::io::stdout().lock(), &summaries)
    }

    /// Run the ETL part of the command and return one summary per table
    pub async fn execute(&self, config: EtlConfig) -> Result<Vec<WriteSummary>> {
        let command = self.cli.command();
        if command == Commands::Config {
            return Ok(Vec::new());
        }
        let session = Session::new(config)?;

        match command {
            Commands::Run | Commands::Config => {
                let output = run_pipeline(&session).await?;
                Ok(output.summaries().cloned().collect())
            }
            Commands::SongData => Ok(process_song_data(&session).await?.summaries),
            Commands::LogData { songs_table } => {
                let songs = match songs_table {
                    Some(url) => TableLocation::parse(&url, &session.config().aws)?,
                    None => session.table(SONGS_TABLE)?,
                };
                Ok(process_log_data(&session, &songs).await?.summaries)
            }
        }
    }

    /// Configuration from the file plus command-line overrides
    ///
    /// An explicit `--config` must exist; the default path is optional.
    pub fn load_config(&self) -> Result<EtlConfig> {
        let mut config = match &self.cli.config {
            Some(path) => EtlConfig::from_file(path)?,
            None => EtlConfig::load_or_default(DEFAULT_CONFIG_PATH)?,
        };

        if let Some(input) = &self.cli.input {
            config = config.with_input(input);
        }
        if let Some(output) = &self.cli.output {
            config = config.with_output(output);
        }
        config.validate()?;
        Ok(config)
    }
}

/// One JSON line per written table
pub fn write_summaries(out: &mut impl Write, summaries: &[WriteSummary]) -> Result<()> {
    for summary in summaries {
        writeln!(out, "{}", serde_json::to_string(summary)?)?;
    }
    out.flush()?;
    Ok(())
}
