//! Output table schema versioning and column layout.

/// Current schema version for the output tables.
///
/// Bumped on a MAJOR when columns are removed or reordered, MINOR when a
/// trailing column is added.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Columns of the main scores table, in file order.
pub const SCORES_COLUMNS: [&str; 4] = ["id", "score", "industry", "percentile"];

/// Columns of the historical drift table, in file order.
///
/// `run_id` is the batch index the row was produced for.
pub const DRIFT_COLUMNS: [&str; 3] = ["run_id", "id", "percentile"];
