//! Tests for the ETL stages

use super::tables::*;
use super::*;
use crate::config::EtlConfig;
use crate::engine::Engine;
use crate::error::Error;
use crate::frame::Relation;
use crate::output::{read_table, TableLocation};
use crate::session::Session;
use crate::storage::Storage;
use bytes::Bytes;
use chrono::FixedOffset;
use object_store::path::Path as ObjectPath;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// ============================================================================
// Fixtures
// ============================================================================

fn box_tops() -> Value {
    json!({
        "num_songs": 1,
        "artist_id": "ARMJAGH1187FB546F3",
        "artist_latitude": 35.14968,
        "artist_longitude": -90.04892,
        "artist_location": "Memphis, TN",
        "artist_name": "The Box Tops",
        "song_id": "SOCIWDW12A8C13D406",
        "title": "Soul Deep",
        "duration": 148.03546,
        "year": 1969
    })
}

fn casual() -> Value {
    json!({
        "num_songs": 1,
        "artist_id": "ARD7TVE1187B99BFB1",
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "California - LA",
        "artist_name": "Casual",
        "song_id": "SOMZWCG12A8C13C480",
        "title": "I Didn't Mean To",
        "duration": 218.93179,
        "year": 0
    })
}

fn event(page: &str, user: &str, level: &str, song: Option<&str>, ts: i64) -> Value {
    json!({
        "artist": song.map(|_| "Someone"),
        "auth": "Logged In",
        "firstName": format!("First{user}"),
        "gender": "F",
        "itemInSession": 0,
        "lastName": format!("Last{user}"),
        "length": song.map(|_| 200.0),
        "level": level,
        "location": "Dallas-Fort Worth-Arlington, TX",
        "method": "PUT",
        "page": page,
        "registration": 1_540_991_795_796.0,
        "sessionId": 829,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (Windows NT 6.1; WOW64)",
        "userId": user
    })
}

fn events() -> Vec<Value> {
    vec![
        event("NextSong", "91", "free", Some("Soul Deep"), 1_541_721_977_796),
        event("NextSong", "91", "free", Some("Not In Catalog"), 1_541_722_000_000),
        event("Home", "15", "paid", None, 1_541_722_100_000),
        event("NextSong", "15", "paid", Some("I Didn't Mean To"), 1_541_800_000_000),
    ]
}

async fn put_json(storage: &Storage, path: &str, records: &[Value]) {
    let body = records
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    storage
        .put(&ObjectPath::parse(path).unwrap(), Bytes::from(body))
        .await
        .unwrap();
}

/// Input storage holding both datasets
async fn seeded_input() -> Storage {
    let input = Storage::in_memory();
    put_json(&input, "song_data/A/A/A/TRAAAAW128F429D538.json", &[casual()]).await;
    put_json(&input, "song_data/A/A/B/TRAAABD128F429CF47.json", &[box_tops()]).await;
    // the same song twice in the dataset
    put_json(&input, "song_data/A/B/A/TRABACN128F425B784.json", &[casual()]).await;
    put_json(&input, "log_data/2018/11/2018-11-09-events.json", &events()).await;
    input
}

fn session(input: &Storage, output: &Storage) -> Session {
    Session::with_storage(EtlConfig::default(), input.clone(), output.clone()).unwrap()
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

/// Engine with `records` loaded as `table`
fn engine_with(table: &str, records: &[Value]) -> Engine {
    let engine = Engine::new().unwrap();
    engine.load_json_records(table, records).unwrap();
    engine
}

/// Whole engine table, rows sorted
fn contents(engine: &Engine, table: &str) -> Relation {
    engine
        .query(&format!("SELECT * FROM \"{table}\" ORDER BY ALL"))
        .unwrap()
}

fn sorted_records(relation: &Relation) -> Vec<String> {
    let mut records: Vec<String> = relation
        .to_records()
        .iter()
        .map(Value::to_string)
        .collect();
    records.sort();
    records
}

async fn directories(location: &TableLocation) -> Vec<String> {
    let mut dirs: Vec<String> = location
        .storage()
        .list("")
        .await
        .unwrap()
        .iter()
        .filter_map(|p| p.as_ref().rsplit_once('/').map(|(dir, _)| dir.to_string()))
        .collect();
    dirs.dedup();
    dirs
}

// ============================================================================
// Song Tables
// ============================================================================

#[test]
fn test_songs_table_is_distinct_projection() {
    let engine = engine_with("raw", &[casual(), box_tops(), casual()]);
    assert_eq!(songs_table(&engine, "raw").unwrap(), 2);

    let songs = contents(&engine, SONGS_TABLE);
    assert_eq!(songs.columns(), &SONG_COLUMNS);
    assert_eq!(
        songs.rows()[1],
        vec![
            json!("SOMZWCG12A8C13C480"),
            json!("I Didn't Mean To"),
            json!("ARD7TVE1187B99BFB1"),
            json!(0),
            json!(218.93179),
        ]
    );
}

#[test]
fn test_songs_table_mixed_integer_and_float_values_collapse() {
    let mut whole = casual();
    whole["duration"] = json!(200);
    let mut fractional = casual();
    fractional["duration"] = json!(200.0);

    let engine = engine_with("raw", &[whole, fractional]);
    assert_eq!(songs_table(&engine, "raw").unwrap(), 1);
    assert_eq!(
        contents(&engine, SONGS_TABLE).column("duration").unwrap(),
        vec![&json!(200.0)]
    );
}

#[test]
fn test_artists_table_one_row_per_distinct_tuple() {
    let mut moved = box_tops();
    moved["artist_location"] = json!("Nashville, TN");
    let engine = engine_with("raw", &[box_tops(), casual(), box_tops(), moved]);

    // the relocated artist is a distinct tuple
    assert_eq!(artists_table(&engine, "raw").unwrap(), 3);
    let artists = contents(&engine, ARTISTS_TABLE);
    assert_eq!(artists.columns(), &ARTIST_COLUMNS);
    assert_eq!(artists.column("artist_latitude").unwrap()[0], &Value::Null);
}

#[test]
fn test_artists_table_mixed_integer_and_float_coordinates_collapse() {
    let mut whole = box_tops();
    whole["artist_latitude"] = json!(35);
    let mut fractional = box_tops();
    fractional["artist_latitude"] = json!(35.0);

    let engine = engine_with("raw", &[whole, fractional]);
    assert_eq!(artists_table(&engine, "raw").unwrap(), 1);
}

#[test]
fn test_corrupt_records_project_to_one_null_row() {
    let engine = engine_with(
        "raw",
        &[
            casual(),
            json!({"_corrupt_record": "{\"song_id\": "}),
            json!({"_corrupt_record": "garbage"}),
        ],
    );

    assert_eq!(songs_table(&engine, "raw").unwrap(), 2);
    assert_eq!(artists_table(&engine, "raw").unwrap(), 2);

    let songs = contents(&engine, SONGS_TABLE);
    let null_rows: Vec<_> = songs
        .rows()
        .iter()
        .filter(|row| row.iter().all(Value::is_null))
        .collect();
    assert_eq!(null_rows.len(), 1);
}

#[test]
fn test_songs_table_missing_column() {
    let engine = engine_with("raw", &[json!({"song_id": "S1", "title": "T"})]);
    let err = songs_table(&engine, "raw").unwrap_err();
    assert!(matches!(err, Error::ColumnNotFound { .. }));
}

// ============================================================================
// Log Tables
// ============================================================================

#[test]
fn test_only_next_song_events_kept() {
    let mut logs = events();
    logs.push(json!({"page": null, "userId": "7"}));
    let engine = engine_with("logs", &logs);

    assert_eq!(next_song_events(&engine, "logs").unwrap(), 3);
    let plays = contents(&engine, NEXT_SONG_EVENTS);
    assert!(plays
        .column("page")
        .unwrap()
        .iter()
        .all(|p| *p == &json!("NextSong")));
}

#[test]
fn test_users_table_keeps_level_variants() {
    let engine = engine_with(
        "plays",
        &[
            event("NextSong", "91", "free", Some("A"), 1),
            event("NextSong", "91", "free", Some("B"), 2),
            event("NextSong", "91", "paid", Some("C"), 3),
        ],
    );
    assert_eq!(users_table(&engine, "plays").unwrap(), 2);
    assert_eq!(contents(&engine, USERS_TABLE).columns(), &USER_COLUMNS);
}

#[test]
fn test_event_times_from_ts() {
    let engine = engine_with(
        "plays",
        &[event("NextSong", "91", "free", Some("Soul Deep"), 1_541_721_977_796)],
    );
    with_event_times(&engine, "plays", utc()).unwrap();

    let times = engine
        .query(&format!(
            "SELECT \"{TIMESTAMP_COLUMN}\", \"{DATETIME_COLUMN}\" FROM {SONG_PLAYS}"
        ))
        .unwrap();
    assert_eq!(
        times.rows(),
        &[vec![json!(1_541_721_977.796), json!("2018-11-09 00:06:17")]]
    );
}

#[test]
fn test_event_times_null_ts() {
    let engine = engine_with(
        "plays",
        &[
            json!({"page": "NextSong", "ts": null}),
            json!({"page": "NextSong", "ts": 1_541_721_977_796_i64}),
        ],
    );
    with_event_times(&engine, "plays", utc()).unwrap();

    let times = engine
        .query(&format!(
            "SELECT \"{TIMESTAMP_COLUMN}\", \"{DATETIME_COLUMN}\" FROM {SONG_PLAYS} WHERE ts IS NULL"
        ))
        .unwrap();
    assert_eq!(times.rows(), &[vec![Value::Null, Value::Null]]);
}

#[test]
fn test_time_table_identical_ts_identical_parts() {
    let engine = engine_with(
        "plays",
        &[
            event("NextSong", "91", "free", Some("A"), 1_541_721_977_796),
            event("NextSong", "15", "paid", Some("B"), 1_541_721_977_796),
            event("NextSong", "15", "paid", Some("C"), 1_541_721_977_100),
        ],
    );
    with_event_times(&engine, "plays", utc()).unwrap();

    // all three truncate to the same second
    assert_eq!(time_table(&engine, SONG_PLAYS).unwrap(), 1);
    let time = contents(&engine, TIME_TABLE);
    assert_eq!(time.columns(), &TIME_COLUMNS);
    assert_eq!(
        time.rows(),
        &[vec![
            json!("2018-11-09 00:06:17"),
            json!(0),
            json!(9),
            json!(45),
            json!(11),
            json!(2018),
            json!(6),
        ]]
    );
}

#[test]
fn test_time_table_follows_session_offset() {
    let engine = engine_with(
        "plays",
        &[event("NextSong", "91", "free", Some("A"), 1_541_721_977_796)],
    );
    let west = FixedOffset::east_opt(-300 * 60).unwrap();
    with_event_times(&engine, "plays", west).unwrap();
    time_table(&engine, SONG_PLAYS).unwrap();

    let time = contents(&engine, TIME_TABLE);
    let row = &time.rows()[0];
    assert_eq!(row[0], json!("2018-11-08 19:06:17"));
    // Thursday
    assert_eq!(row[6], json!(5));
    assert_eq!(row[2], json!(8));
}

#[test]
fn test_songplays_drop_unmatched_titles() {
    let engine = engine_with("logs", &events());
    engine
        .load_json_records("raw_songs", &[casual(), box_tops()])
        .unwrap();
    next_song_events(&engine, "logs").unwrap();
    with_event_times(&engine, NEXT_SONG_EVENTS, utc()).unwrap();
    time_table(&engine, SONG_PLAYS).unwrap();
    songs_table(&engine, "raw_songs").unwrap();

    let count = songplays_table(&engine, SONG_PLAYS, TIME_TABLE, SONGS_TABLE).unwrap();
    assert_eq!(count, 2);

    let songplays = engine
        .query(&format!("SELECT * FROM {SONGPLAYS_TABLE} ORDER BY songplay_id"))
        .unwrap();
    assert_eq!(songplays.columns(), &SONGPLAY_COLUMNS);

    let first = &songplays.to_records()[0];
    assert_eq!(first["songplay_id"], json!(0));
    assert_eq!(first["start_time"], json!("2018-11-09 00:06:17"));
    assert_eq!(first["song_id"], json!("SOCIWDW12A8C13D406"));
    assert_eq!(first["artist_id"], json!("ARMJAGH1187FB546F3"));
    assert_eq!(first["year"], json!(1969));
    assert_eq!(first["month"], json!(11));

    let ids: Vec<&Value> = songplays.column("songplay_id").unwrap();
    assert_eq!(ids, vec![&json!(0), &json!(1)]);
    assert!(songplays
        .column("song_id")
        .unwrap()
        .iter()
        .all(|id| !id.is_null()));
}

#[test]
fn test_songplays_require_event_times() {
    let engine = engine_with("logs", &events());
    engine.load_json_records("raw_songs", &[casual()]).unwrap();
    next_song_events(&engine, "logs").unwrap();

    let err = time_table(&engine, "logs").unwrap_err();
    assert!(matches!(err, Error::ColumnNotFound { .. }));
    let err = songplays_table(&engine, NEXT_SONG_EVENTS, "logs", "raw_songs").unwrap_err();
    assert!(matches!(err, Error::ColumnNotFound { .. }));
}

// ============================================================================
// Stages
// ============================================================================

#[tokio::test]
async fn test_song_stage_writes_partitioned_songs() {
    let input = seeded_input().await;
    let output = Storage::in_memory();
    let out = process_song_data(&session(&input, &output)).await.unwrap();

    assert_eq!(out.songs.name(), SONGS_TABLE);
    assert_eq!(out.summaries[0].rows, 2);
    assert_eq!(out.summaries[1].table, ARTISTS_TABLE);
    assert_eq!(out.summaries[1].rows, 2);
    assert_eq!(
        directories(&out.songs).await,
        vec![
            "year=0/artist_id=ARD7TVE1187B99BFB1",
            "year=1969/artist_id=ARMJAGH1187FB546F3",
        ]
    );
    assert_eq!(read_table(&out.artists).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_song_stage_mixed_numbers_write_one_row() {
    let input = Storage::in_memory();
    let mut whole = casual();
    whole["duration"] = json!(200);
    whole["artist_latitude"] = json!(34);
    let mut fractional = casual();
    fractional["duration"] = json!(200.0);
    fractional["artist_latitude"] = json!(34.0);
    put_json(&input, "song_data/A/A/A/TRAAAAW128F429D538.json", &[whole]).await;
    put_json(&input, "song_data/A/A/B/TRAAABD128F429CF47.json", &[fractional]).await;

    let output = Storage::in_memory();
    let out = process_song_data(&session(&input, &output)).await.unwrap();
    assert_eq!(out.summaries[0].rows, 1);
    assert_eq!(out.summaries[1].rows, 1);

    let songs = read_table(&out.songs).await.unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(songs.column("duration").unwrap(), vec![&json!(200.0)]);
    let artists = read_table(&out.artists).await.unwrap();
    assert_eq!(artists.column("artist_latitude").unwrap(), vec![&json!(34.0)]);
}

#[tokio::test]
async fn test_song_stage_permissive_corrupt_lines() {
    let input = Storage::in_memory();
    let body = format!("{}\nnot json\n{{\"song_id\": ", casual());
    input
        .put(
            &ObjectPath::parse("song_data/A/A/A/TRAAAAW128F429D538.json").unwrap(),
            Bytes::from(body),
        )
        .await
        .unwrap();

    let output = Storage::in_memory();
    let out = process_song_data(&session(&input, &output)).await.unwrap();
    assert_eq!(out.summaries[0].rows, 2);
    assert_eq!(out.summaries[1].rows, 2);
    assert_eq!(
        directories(&out.songs).await,
        vec![
            "year=0/artist_id=ARD7TVE1187B99BFB1",
            "year=__HIVE_DEFAULT_PARTITION__/artist_id=__HIVE_DEFAULT_PARTITION__",
        ]
    );

    let songs = read_table(&out.songs).await.unwrap();
    let null_rows = songs
        .rows()
        .iter()
        .filter(|row| row.iter().all(Value::is_null))
        .count();
    assert_eq!(null_rows, 1);
}

#[tokio::test]
async fn test_log_stage_reads_songs_from_given_location() {
    let input = seeded_input().await;
    let output = Storage::in_memory();
    let session = session(&input, &output);
    let song_data = process_song_data(&session).await.unwrap();

    let out = process_log_data(&session, &song_data.songs).await.unwrap();
    let tables: Vec<(&str, usize)> = out
        .summaries
        .iter()
        .map(|s| (s.table.as_str(), s.rows))
        .collect();
    assert_eq!(
        tables,
        vec![(USERS_TABLE, 2), (TIME_TABLE, 3), (SONGPLAYS_TABLE, 2)]
    );

    assert_eq!(directories(&out.time).await, vec!["year=2018/month=11"]);
    assert_eq!(
        directories(&out.songplays).await,
        vec!["year=0/month=11", "year=1969/month=11"]
    );

    let songplays = read_table(&out.songplays).await.unwrap();
    let mut users: Vec<&Value> = songplays.column("userId").unwrap();
    users.sort_by_key(|v| v.to_string());
    assert_eq!(users, vec![&json!("15"), &json!("91")]);
}

#[tokio::test]
async fn test_log_stage_requires_songs_table() {
    let input = seeded_input().await;
    let output = Storage::in_memory();
    let session = session(&input, &output);
    let missing = session.table(SONGS_TABLE).unwrap();

    let err = process_log_data(&session, &missing).await.unwrap_err();
    assert!(matches!(err, Error::EmptyTable { .. }));
}

#[tokio::test]
async fn test_missing_input_is_error() {
    let input = Storage::in_memory();
    let output = Storage::in_memory();
    let err = process_song_data(&session(&input, &output))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoInputFiles { .. }));
    assert!(err.is_input_error());
}

#[tokio::test]
async fn test_pipeline_writes_all_tables() {
    let input = seeded_input().await;
    let output = Storage::in_memory();
    let out = run_pipeline(&session(&input, &output)).await.unwrap();

    let tables: Vec<&str> = out.summaries().map(|s| s.table.as_str()).collect();
    assert_eq!(
        tables,
        vec![
            SONGS_TABLE,
            ARTISTS_TABLE,
            USERS_TABLE,
            TIME_TABLE,
            SONGPLAYS_TABLE
        ]
    );
    let listed = output.list("").await.unwrap();
    for table in tables {
        let marker = ObjectPath::parse(format!("{table}/_SUCCESS")).unwrap();
        assert!(listed.contains(&marker), "{table} has no marker");
    }
}

#[tokio::test]
async fn test_rerun_is_logically_identical() {
    let input = seeded_input().await;
    let output = Storage::in_memory();

    let first = run_pipeline(&session(&input, &output)).await.unwrap();
    let mut before = Vec::new();
    for location in [
        &first.song_data.songs,
        &first.song_data.artists,
        &first.log_data.users,
        &first.log_data.time,
    ] {
        before.push(sorted_records(&read_table(location).await.unwrap()));
    }

    let second = run_pipeline(&session(&input, &output)).await.unwrap();
    let mut after = Vec::new();
    for location in [
        &second.song_data.songs,
        &second.song_data.artists,
        &second.log_data.users,
        &second.log_data.time,
    ] {
        after.push(sorted_records(&read_table(location).await.unwrap()));
    }

    assert_eq!(before, after);
}
