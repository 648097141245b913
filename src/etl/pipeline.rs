//! Two-stage pipeline
//!
//! The log-data stage depends on the songs table written by the song-data
//! stage. That dependency is passed as a value, never rediscovered from
//! storage by name.

use super::logs::{process_log_data, LogDataOutput};
use super::songs::{process_song_data, SongDataOutput};
use crate::error::Result;
use crate::output::WriteSummary;
use crate::session::Session;
use std::time::Instant;

/// Outputs of a full run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub song_data: SongDataOutput,
    pub log_data: LogDataOutput,
}

impl PipelineOutput {
    /// Write summaries of every table, in write order
    pub fn summaries(&self) -> impl Iterator<Item = &WriteSummary> {
        self.song_data
            .summaries
            .iter()
            .chain(self.log_data.summaries.iter())
    }
}

/// Run the song-data stage, then the log-data stage against its songs table
pub async fn run_pipeline(session: &Session) -> Result<PipelineOutput> {
    let start = Instant::now();
    tracing::info!(
        "Starting run {} ({} -> {})",
        session.run_id(),
        session.input().root_url(),
        session.output().root_url()
    );

    let song_data = process_song_data(session).await?;
    let log_data = process_log_data(session, &song_data.songs).await?;

    let output = PipelineOutput {
        song_data,
        log_data,
    };
    tracing::info!(
        "Run {} finished: {} tables, {} rows in {:.2?}",
        session.run_id(),
        output.summaries().count(),
        output.summaries().map(|s| s.rows).sum::<usize>(),
        start.elapsed()
    );
    Ok(output)
}
