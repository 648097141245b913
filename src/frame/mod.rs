//! Relation module
//!
//! Materialized query results. The engine hands back Arrow batches; a
//! [`Relation`] turns them into JSON rows for summaries, read-back and
//! tests.

mod relation;

pub use relation::{Relation, Row};
