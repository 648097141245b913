//! ETL stages
//!
//! # Overview
//!
//! - [`process_song_data`] reads song metadata and writes `songs_table`
//!   and `artists_table`
//! - [`process_log_data`] reads event logs and writes `user_table`,
//!   `time_table` and `songplays_table`, joining against the songs table
//! - [`run_pipeline`] runs both in order

mod logs;
mod pipeline;
mod songs;
pub mod tables;
pub mod time;

pub use logs::{
    next_song_events, process_log_data, songplays_table, time_table, users_table,
    with_event_times, LogDataOutput, DATETIME_COLUMN, TIMESTAMP_COLUMN,
};
pub use pipeline::{run_pipeline, PipelineOutput};
pub use songs::{artists_table, process_song_data, songs_table, SongDataOutput};

#[cfg(test)]
mod tests;
