//! JSON Lines reader
//!
//! One record per line. A line holding an array contributes one record
//! per element. Anything that is not a JSON object is a malformed record
//! and handled according to the [`ReadMode`].

use super::pattern::PathGlob;
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::types::{JsonValue, ReadMode};
use serde_json::Value;

/// Column holding the raw text of malformed lines in permissive mode
pub const CORRUPT_RECORD_COLUMN: &str = "_corrupt_record";

/// Reader for JSON Lines datasets
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReader {
    mode: ReadMode,
}

/// Outcome of reading a dataset
#[derive(Debug, Clone)]
pub struct JsonScan {
    /// Decoded records, in file order
    pub records: Vec<JsonValue>,
    /// Number of files read
    pub files: usize,
    /// Number of malformed lines seen
    pub malformed: usize,
}

impl JsonReader {
    /// Create a reader with the given malformed-record mode
    pub fn new(mode: ReadMode) -> Self {
        Self { mode }
    }

    /// The configured mode
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Decode one file body into records
    ///
    /// Returns the records and the number of malformed lines.
    pub fn decode(&self, path: &str, body: &str) -> Result<(Vec<JsonValue>, usize)> {
        let mut records = Vec::new();
        let mut malformed = 0;

        for (line_num, line) in body.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let problem = match serde_json::from_str::<Value>(line) {
                Ok(Value::Object(obj)) => {
                    records.push(Value::Object(obj));
                    None
                }
                Ok(Value::Array(items)) if items.iter().all(Value::is_object) => {
                    records.extend(items);
                    None
                }
                Ok(Value::Array(_)) => Some("array elements must be objects".to_string()),
                Ok(_) => Some("expected a JSON object".to_string()),
                Err(e) => Some(e.to_string()),
            };

            let Some(message) = problem else {
                continue;
            };
            malformed += 1;

            match self.mode {
                ReadMode::FailFast => {
                    return Err(Error::MalformedRecord {
                        path: path.to_string(),
                        line: line_num + 1,
                        message,
                    });
                }
                ReadMode::DropMalformed => {
                    tracing::warn!(
                        "Dropping malformed record in {} at line {}: {}",
                        path,
                        line_num + 1,
                        message
                    );
                }
                ReadMode::Permissive => {
                    let mut obj = serde_json::Map::new();
                    obj.insert(
                        CORRUPT_RECORD_COLUMN.to_string(),
                        Value::String(line.to_string()),
                    );
                    records.push(Value::Object(obj));
                }
            }
        }

        Ok((records, malformed))
    }

    /// Read every file matching `glob` under `storage`
    ///
    /// An empty match is an error.
    pub async fn read(&self, storage: &Storage, glob: &PathGlob) -> Result<JsonScan> {
        let files = glob.expand(storage).await?;
        if files.is_empty() {
            return Err(Error::NoInputFiles {
                pattern: storage.url_for(glob.as_str()),
            });
        }

        let mut records = Vec::new();
        let mut malformed = 0;
        for file in &files {
            let bytes = storage.get(file).await?;
            let body = String::from_utf8_lossy(&bytes);
            let (mut decoded, bad) = self.decode(file.as_ref(), &body)?;
            tracing::debug!("Read {} records from {}", decoded.len(), file);
            malformed += bad;
            records.append(&mut decoded);
        }

        Ok(JsonScan {
            records,
            files: files.len(),
            malformed,
        })
    }
}
