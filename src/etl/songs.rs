//! Song-data stage: songs and artists dimensions

use super::tables::{
    ARTISTS_TABLE, ARTIST_COLUMNS, SONGS_TABLE, SONG_COLUMNS, SONG_PARTITIONS, STAGING_SONGS,
};
use crate::engine::{select_distinct, Engine};
use crate::error::Result;
use crate::output::{TableLocation, WriteSummary};
use crate::session::Session;

/// What the song-data stage produced
#[derive(Debug, Clone)]
pub struct SongDataOutput {
    /// Where the songs table was written; the log-data stage reads it back
    pub songs: TableLocation,
    pub artists: TableLocation,
    pub summaries: Vec<WriteSummary>,
}

/// Read song metadata, then write the songs and artists tables
pub async fn process_song_data(session: &Session) -> Result<SongDataOutput> {
    let glob = session.song_data_glob()?;
    tracing::info!(
        "Reading song data from {}",
        session.input().url_for(glob.as_str())
    );

    let scan = session.reader().read(session.input(), &glob).await?;
    let engine = session.engine();
    let loaded = engine.load_json_records(STAGING_SONGS, &scan.records)?;
    tracing::info!(
        "Loaded {} song records from {} files ({} malformed)",
        loaded,
        scan.files,
        scan.malformed
    );

    songs_table(engine, STAGING_SONGS)?;
    let songs_location = session.table(SONGS_TABLE)?;
    let songs_summary = session
        .writer()
        .write(engine, SONGS_TABLE, &songs_location, &SONG_PARTITIONS)
        .await?;

    artists_table(engine, STAGING_SONGS)?;
    let artists_location = session.table(ARTISTS_TABLE)?;
    let artists_summary = session
        .writer()
        .write(engine, ARTISTS_TABLE, &artists_location, &[])
        .await?;

    Ok(SongDataOutput {
        songs: songs_location,
        artists: artists_location,
        summaries: vec![songs_summary, artists_summary],
    })
}

/// Distinct song projections of `source` into `songs_table`
pub fn songs_table(engine: &Engine, source: &str) -> Result<usize> {
    engine.require_columns(source, &SONG_COLUMNS)?;
    engine.create_table(SONGS_TABLE, &select_distinct(&SONG_COLUMNS, source))
}

/// Distinct artist projections of `source` into `artists_table`
///
/// An artist whose location or coordinates differ between songs appears
/// once per variant.
pub fn artists_table(engine: &Engine, source: &str) -> Result<usize> {
    engine.require_columns(source, &ARTIST_COLUMNS)?;
    engine.create_table(ARTISTS_TABLE, &select_distinct(&ARTIST_COLUMNS, source))
}
