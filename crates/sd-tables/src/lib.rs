//! Score Drift output tables.
//!
//! This crate provides:
//! - Schema definitions for the scores and drift tables
//! - Delimited-text encoding with a configurable quote character
//! - An append-only writer that emits the header exactly once
//! - A reader for round-trip checks and drift queries

pub mod format;
pub mod reader;
pub mod schema;
pub mod writer;

pub use format::{FormatError, TableFormat};
pub use reader::read_table;
pub use schema::{drift_schema, scores_schema, TableName, TableSchema};
pub use writer::{AppendTable, TableError};
