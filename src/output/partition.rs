//! Hive-style partition directories
//!
//! `year=2018/month=11` segments: values are rendered as text, characters
//! that would break a path are percent-escaped, and nulls use the Hive
//! default partition name.

/// Directory value used for null partition values
pub const DEFAULT_PARTITION_NAME: &str = "__HIVE_DEFAULT_PARTITION__";

/// How DuckDB names null partition directories
const ENGINE_NULL: &str = "NULL";

/// Characters escaped in partition directory names
fn needs_escape(c: char) -> bool {
    c.is_ascii_control()
        || matches!(
            c,
            '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '{' | '[' | ']' | '^'
        )
}

/// Escape a partition value for use in a path segment
pub fn escape_partition_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Reverse [`escape_partition_value`]
pub fn unescape_partition_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    char::from(b).to_digit(16).map(|d| d as u8)
}

/// `col=value` segment for one partition column
///
/// Nulls and empty strings map to [`DEFAULT_PARTITION_NAME`].
pub fn partition_segment(column: &str, value: Option<&str>) -> String {
    let value = match value {
        None | Some("") => DEFAULT_PARTITION_NAME.to_string(),
        Some(v) => escape_partition_value(v),
    };
    format!("{}={value}", escape_partition_value(column))
}

/// Split a `col=value` segment; `None` for non-partition segments
pub fn parse_partition_segment(segment: &str) -> Option<(String, Option<String>)> {
    let (column, value) = segment.split_once('=')?;
    if column.is_empty() {
        return None;
    }
    let value = if value == DEFAULT_PARTITION_NAME {
        None
    } else {
        Some(unescape_partition_value(value))
    };
    Some((unescape_partition_value(column), value))
}

/// Rewrite a directory written by DuckDB's `PARTITION_BY` in table layout
///
/// DuckDB spells nulls `NULL` and percent-encodes values.
pub fn segment_from_engine(segment: &str) -> Option<String> {
    let (column, value) = segment.split_once('=')?;
    let column = unescape_partition_value(column);
    if value == ENGINE_NULL {
        return Some(partition_segment(&column, None));
    }
    Some(partition_segment(&column, Some(&unescape_partition_value(value))))
}

/// Rewrite a table layout directory for DuckDB's hive partition reader
pub fn segment_to_engine(segment: &str) -> Option<String> {
    let (column, value) = parse_partition_segment(segment)?;
    let value = value.map_or_else(|| ENGINE_NULL.to_string(), |v| escape_partition_value(&v));
    Some(format!("{}={value}", escape_partition_value(&column)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some("2018"), "year=2018" ; "integer")]
    #[test_case(Some("ARD7TVE1187B99BFB1"), "artist_id=ARD7TVE1187B99BFB1" ; "plain string")]
    #[test_case(Some("AC/DC"), "artist_id=AC%2FDC" ; "slash escaped")]
    #[test_case(Some("a=b:c"), "artist_id=a%3Db%3Ac" ; "equals and colon escaped")]
    #[test_case(None, "year=__HIVE_DEFAULT_PARTITION__" ; "null")]
    #[test_case(Some(""), "level=__HIVE_DEFAULT_PARTITION__" ; "empty string")]
    fn test_partition_segment(value: Option<&str>, expected: &str) {
        let column = expected.split('=').next().unwrap();
        assert_eq!(partition_segment(column, value), expected);
    }

    #[test]
    fn test_escape_roundtrip() {
        for raw in ["AC/DC", "100%", "x=y", "plain", "naïve #1"] {
            assert_eq!(unescape_partition_value(&escape_partition_value(raw)), raw);
        }
    }

    #[test]
    fn test_unescape_leaves_invalid_sequences() {
        assert_eq!(unescape_partition_value("50%"), "50%");
        assert_eq!(unescape_partition_value("%zz"), "%zz");
    }

    #[test]
    fn test_parse_partition_segment() {
        assert_eq!(
            parse_partition_segment("year=2018"),
            Some(("year".to_string(), Some("2018".to_string())))
        );
        assert_eq!(
            parse_partition_segment("year=__HIVE_DEFAULT_PARTITION__"),
            Some(("year".to_string(), None))
        );
        assert_eq!(parse_partition_segment("part-00000.parquet"), None);
    }

    #[test_case("year=1969", "year=1969" ; "plain")]
    #[test_case("year=NULL", "year=__HIVE_DEFAULT_PARTITION__" ; "null")]
    #[test_case("artist_id=AC%2FDC", "artist_id=AC%2FDC" ; "encoded slash")]
    #[test_case("location=San%20Jose", "location=San Jose" ; "encoded space")]
    fn test_segment_from_engine(engine: &str, table: &str) {
        assert_eq!(segment_from_engine(engine).as_deref(), Some(table));
    }

    #[test]
    fn test_segment_to_engine() {
        assert_eq!(
            segment_to_engine("year=__HIVE_DEFAULT_PARTITION__").as_deref(),
            Some("year=NULL")
        );
        assert_eq!(
            segment_to_engine("artist_id=AC%2FDC").as_deref(),
            Some("artist_id=AC%2FDC")
        );
        assert_eq!(segment_to_engine("data_0.parquet"), None);
    }
}
