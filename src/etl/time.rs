//! Event timestamp derivation
//!
//! Log events carry `ts` in epoch milliseconds. The time table is built
//! from the formatted local date-time string, so every part derived here
//! comes from whole seconds.

use crate::engine::{quote_ident, quote_literal};
use chrono::FixedOffset;

/// Format of `datetime` and `start_time`
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `ts / 1000` as float seconds; null unless `ts` reads as a number
pub fn epoch_seconds_sql(ts: &str) -> String {
    format!("TRY_CAST({} AS DOUBLE) / 1000", quote_ident(ts))
}

/// Local date-time text of an epoch-millisecond column
///
/// Fractional seconds are truncated toward zero before the offset is
/// applied.
pub fn event_datetime_sql(ts: &str, offset: &FixedOffset) -> String {
    format!(
        "strftime(epoch_ms((TRY_CAST(trunc({}) AS BIGINT) + {}) * 1000), {})",
        epoch_seconds_sql(ts),
        offset.local_minus_utc(),
        quote_literal(DATETIME_FORMAT)
    )
}

/// Distinct calendar breakdowns of every value of `datetime` in `source`
///
/// `week` is the ISO week; `weekday` runs from 1 = Sunday to 7 = Saturday.
pub fn time_parts_query(source: &str, datetime: &str) -> String {
    format!(
        "SELECT DISTINCT \"start_time\", hour(t) AS \"hour\", day(t) AS \"day\", \
         week(t) AS \"week\", month(t) AS \"month\", year(t) AS \"year\", \
         dayofweek(t) + 1 AS \"weekday\" \
         FROM (SELECT {dt} AS \"start_time\", try_strptime({dt}, {fmt}) AS t FROM {src})",
        dt = quote_ident(datetime),
        fmt = quote_literal(DATETIME_FORMAT),
        src = quote_ident(source)
    )
}
