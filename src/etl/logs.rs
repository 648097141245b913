//! Log-data stage: users and time dimensions plus the songplays fact table

use super::tables::{
    NEXT_SONG_EVENTS, NEXT_SONG_PAGE, SONGPLAYS_TABLE, SONGPLAY_PARTITIONS, SONGS_LOOKUP,
    SONG_PLAYS, STAGING_EVENTS, TIME_PARTITIONS, TIME_TABLE, USERS_TABLE, USER_COLUMNS,
};
use super::time::{epoch_seconds_sql, event_datetime_sql, time_parts_query};
use crate::engine::{column_list, quote_ident, quote_literal, select_distinct, Engine};
use crate::error::Result;
use crate::output::{load_table, TableLocation, WriteSummary};
use crate::session::Session;
use chrono::FixedOffset;

/// Derived event columns
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const DATETIME_COLUMN: &str = "datetime";

/// What the log-data stage produced
#[derive(Debug, Clone)]
pub struct LogDataOutput {
    pub users: TableLocation,
    pub time: TableLocation,
    pub songplays: TableLocation,
    pub summaries: Vec<WriteSummary>,
}

/// Read event logs, then write the users, time and songplays tables
///
/// `songs` is the songs table written by the song-data stage.
pub async fn process_log_data(session: &Session, songs: &TableLocation) -> Result<LogDataOutput> {
    let glob = session.log_data_glob()?;
    tracing::info!(
        "Reading log data from {}",
        session.input().url_for(glob.as_str())
    );

    let scan = session.reader().read(session.input(), &glob).await?;
    let engine = session.engine();
    engine.load_json_records(STAGING_EVENTS, &scan.records)?;
    let plays = next_song_events(engine, STAGING_EVENTS)?;
    tracing::info!(
        "Loaded {} song play events from {} files ({} malformed)",
        plays,
        scan.files,
        scan.malformed
    );

    let writer = session.writer();
    let mut summaries = Vec::with_capacity(3);

    users_table(engine, NEXT_SONG_EVENTS)?;
    let users_location = session.table(USERS_TABLE)?;
    summaries.push(
        writer
            .write(engine, USERS_TABLE, &users_location, &[])
            .await?,
    );

    with_event_times(engine, NEXT_SONG_EVENTS, session.offset())?;
    time_table(engine, SONG_PLAYS)?;
    let time_location = session.table(TIME_TABLE)?;
    summaries.push(
        writer
            .write(engine, TIME_TABLE, &time_location, &TIME_PARTITIONS)
            .await?,
    );

    tracing::info!("Reading songs table from {}", songs);
    load_table(engine, songs, SONGS_LOOKUP).await?;
    let songplays = songplays_table(engine, SONG_PLAYS, TIME_TABLE, SONGS_LOOKUP)?;
    if songplays < plays {
        tracing::debug!("{} of {} events matched a song title", songplays, plays);
    }
    let songplays_location = session.table(SONGPLAYS_TABLE)?;
    summaries.push(
        writer
            .write(
                engine,
                SONGPLAYS_TABLE,
                &songplays_location,
                &SONGPLAY_PARTITIONS,
            )
            .await?,
    );

    Ok(LogDataOutput {
        users: users_location,
        time: time_location,
        songplays: songplays_location,
        summaries,
    })
}

/// Keep only song play events of `source` in `next_song_events`
pub fn next_song_events(engine: &Engine, source: &str) -> Result<usize> {
    engine.require_columns(source, &["page"])?;
    engine.create_table(
        NEXT_SONG_EVENTS,
        &format!(
            "SELECT * FROM {} WHERE CAST(\"page\" AS VARCHAR) = {}",
            quote_ident(source),
            quote_literal(NEXT_SONG_PAGE)
        ),
    )
}

/// Distinct user projections; one row per level a user was seen at
pub fn users_table(engine: &Engine, plays: &str) -> Result<usize> {
    engine.require_columns(plays, &USER_COLUMNS)?;
    engine.create_table(USERS_TABLE, &select_distinct(&USER_COLUMNS, plays))
}

/// Copy `plays` into `song_plays` with `timestamp` (float seconds) and
/// `datetime` (local text) derived from `ts`
pub fn with_event_times(engine: &Engine, plays: &str, offset: FixedOffset) -> Result<usize> {
    engine.require_columns(plays, &["ts"])?;
    let replaced: Vec<&str> = engine
        .columns(plays)?
        .iter()
        .filter_map(|c| {
            [TIMESTAMP_COLUMN, DATETIME_COLUMN]
                .into_iter()
                .find(|derived| c.eq_ignore_ascii_case(derived))
        })
        .collect();
    let star = if replaced.is_empty() {
        "*".to_string()
    } else {
        format!("* EXCLUDE ({})", column_list(&replaced))
    };

    engine.create_table(
        SONG_PLAYS,
        &format!(
            "SELECT {star}, {} AS {}, {} AS {} FROM {}",
            epoch_seconds_sql("ts"),
            quote_ident(TIMESTAMP_COLUMN),
            event_datetime_sql("ts", &offset),
            quote_ident(DATETIME_COLUMN),
            quote_ident(plays)
        ),
    )
}

/// Distinct calendar breakdowns of every event `datetime` into `time_table`
pub fn time_table(engine: &Engine, plays: &str) -> Result<usize> {
    engine.require_columns(plays, &[DATETIME_COLUMN])?;
    engine.create_table(TIME_TABLE, &time_parts_query(plays, DATETIME_COLUMN))
}

/// Join events to time and songs into `songplays_table`
///
/// Events are matched to songs by exact title. Events with no matching
/// title, or without a `datetime`, are dropped. `year` is the song's year
/// and `month` the event's month. Ids follow event time, then user,
/// session and song.
pub fn songplays_table(engine: &Engine, plays: &str, time: &str, songs: &str) -> Result<usize> {
    engine.require_columns(
        plays,
        &[
            TIMESTAMP_COLUMN,
            DATETIME_COLUMN,
            "userId",
            "level",
            "song",
            "sessionId",
            "location",
            "userAgent",
        ],
    )?;
    engine.require_columns(time, &["start_time", "month"])?;
    engine.require_columns(songs, &["song_id", "title", "artist_id", "year"])?;

    let query = format!(
        "SELECT DISTINCT * FROM (\
         SELECT row_number() OVER (ORDER BY p.\"timestamp\", p.\"userId\", p.\"sessionId\", \
         s.\"song_id\", s.\"artist_id\", s.\"year\", p.\"level\", p.\"location\", p.\"userAgent\") - 1 \
         AS \"songplay_id\", \
         p.\"datetime\" AS \"start_time\", p.\"userId\", p.\"level\", s.\"song_id\", s.\"artist_id\", \
         p.\"sessionId\", p.\"location\", p.\"userAgent\", s.\"year\", t.\"month\" \
         FROM {plays} p \
         JOIN (SELECT \"start_time\", \"month\" FROM {time}) t ON p.\"datetime\" = t.\"start_time\" \
         JOIN {songs} s ON p.\"song\" = s.\"title\")",
        plays = quote_ident(plays),
        time = quote_ident(time),
        songs = quote_ident(songs)
    );
    engine.create_table(SONGPLAYS_TABLE, &query)
}
