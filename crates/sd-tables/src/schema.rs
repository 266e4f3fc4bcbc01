//! Schema definitions for the output tables.

use std::fmt;

use sd_common::schema::{DRIFT_COLUMNS, SCORES_COLUMNS};

/// Output table identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableName {
    /// One row per (entity, batch): `id, score, industry, percentile`.
    Scores,
    /// One row per (batch, entity): `run_id, id, percentile`.
    Drift,
}

impl TableName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Scores => "scores",
            TableName::Drift => "drift",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and ordered column list of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: TableName,
    pub columns: &'static [&'static str],
}

impl TableSchema {
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// Schema for the main scores table.
pub fn scores_schema() -> TableSchema {
    TableSchema {
        name: TableName::Scores,
        columns: &SCORES_COLUMNS,
    }
}

/// Schema for the historical drift table.
pub fn drift_schema() -> TableSchema {
    TableSchema {
        name: TableName::Drift,
        columns: &DRIFT_COLUMNS,
    }
}
