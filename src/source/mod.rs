//! JSON source module
//!
//! Expands path globs over object storage and decodes the matching JSON
//! Lines files into records for the query engine.

mod json;
mod pattern;

pub use json::{JsonReader, JsonScan, CORRUPT_RECORD_COLUMN};
pub use pattern::PathGlob;
