//! Table names, columns and partitioning
//!
//! Output tables keep their directory name inside the engine too.

/// Songs dimension directory
pub const SONGS_TABLE: &str = "songs_table";
/// Artists dimension directory
pub const ARTISTS_TABLE: &str = "artists_table";
/// Users dimension directory
pub const USERS_TABLE: &str = "user_table";
/// Time dimension directory
pub const TIME_TABLE: &str = "time_table";
/// Songplays fact directory
pub const SONGPLAYS_TABLE: &str = "songplays_table";

/// Raw song metadata
pub const STAGING_SONGS: &str = "staging_songs";
/// Raw event logs
pub const STAGING_EVENTS: &str = "staging_events";
/// `NextSong` events
pub const NEXT_SONG_EVENTS: &str = "next_song_events";
/// `NextSong` events with `timestamp` and `datetime`
pub const SONG_PLAYS: &str = "song_plays";
/// Songs table as read back from storage
pub const SONGS_LOOKUP: &str = "songs_lookup";

pub const SONG_COLUMNS: [&str; 5] = ["song_id", "title", "artist_id", "year", "duration"];
pub const SONG_PARTITIONS: [&str; 2] = ["year", "artist_id"];

pub const ARTIST_COLUMNS: [&str; 5] = [
    "artist_id",
    "artist_name",
    "artist_location",
    "artist_latitude",
    "artist_longitude",
];

pub const USER_COLUMNS: [&str; 5] = ["userId", "firstName", "lastName", "gender", "level"];

pub const TIME_COLUMNS: [&str; 7] = ["start_time", "hour", "day", "week", "month", "year", "weekday"];
pub const TIME_PARTITIONS: [&str; 2] = ["year", "month"];

pub const SONGPLAY_COLUMNS: [&str; 11] = [
    "songplay_id",
    "start_time",
    "userId",
    "level",
    "song_id",
    "artist_id",
    "sessionId",
    "location",
    "userAgent",
    "year",
    "month",
];
pub const SONGPLAY_PARTITIONS: [&str; 2] = ["year", "month"];

/// Event `page` value marking a song play
pub const NEXT_SONG_PAGE: &str = "NextSong";
