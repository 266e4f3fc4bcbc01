//! Score Drift core: incremental per-industry percentile ranking over a
//! sliding window of numbered batches.
//!
//! Per batch index the [`Pipeline`] runs load → merge → transform → write:
//! the [`BatchLoader`] pulls records from a [`BatchSource`] into the
//! [`Window`], the [`PercentileTransformer`] ranks the current batch against
//! the window, and a [`ResultSink`] appends the rows.

pub mod cli;
pub mod exit_codes;
pub mod history;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod source;
pub mod transform;
pub mod window;

pub use exit_codes::ExitCode;
pub use history::{entity_history, read_drift, read_scores, DriftPoint, EntityDrift, ScoreRow};
pub use loader::{BatchLoader, LoadedBatch, Merge};
pub use pipeline::{BatchReport, Pipeline, RunSummary};
pub use record::{format_score, parse_score, Percentile, RawRecord, Record, ScoredRecord};
pub use sink::{table_format, MemorySink, ResultSink, TableSink};
pub use source::{parse_batch_json, BatchSource, JsonBatchSource, MemoryBatchSource};
pub use transform::{PercentileTransformer, MIN_HISTORY_INDEX};
pub use window::{BatchSlice, Window, WINDOW_BATCHES};
