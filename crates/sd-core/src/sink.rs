//! Result sinks: where a batch's scored records go.

use tracing::error;

use sd_common::{BatchIndex, Result};
use sd_config::EtlConfig;
use sd_tables::{drift_schema, scores_schema, AppendTable, TableFormat};

use crate::record::{format_score, ScoredRecord};

/// Receives the scored records of one batch at a time, in batch order.
///
/// A write that returns an error must leave no rows of that batch behind,
/// since the pipeline retries the same batch.
pub trait ResultSink {
    fn write_batch(&mut self, index: BatchIndex, rows: &[ScoredRecord]) -> Result<()>;
}

impl<T: ResultSink + ?Sized> ResultSink for &mut T {
    fn write_batch(&mut self, index: BatchIndex, rows: &[ScoredRecord]) -> Result<()> {
        (**self).write_batch(index, rows)
    }
}

impl<T: ResultSink + ?Sized> ResultSink for Box<T> {
    fn write_batch(&mut self, index: BatchIndex, rows: &[ScoredRecord]) -> Result<()> {
        (**self).write_batch(index, rows)
    }
}

/// Appends to the scores table and the drift table.
///
/// The scores table is written first. If the drift append then fails, the
/// scores table is cut back to its size before the batch, so a failed batch
/// leaves neither table changed and can be retried.
#[derive(Debug, Clone)]
pub struct TableSink {
    scores: AppendTable,
    drift: AppendTable,
}

impl TableSink {
    pub fn new(scores: AppendTable, drift: AppendTable) -> Self {
        Self { scores, drift }
    }

    pub fn from_config(config: &EtlConfig) -> Self {
        let format = table_format(config);
        Self {
            scores: AppendTable::new(&config.scores_table, scores_schema(), format),
            drift: AppendTable::new(&config.drift_table, drift_schema(), format),
        }
    }

    pub fn scores(&self) -> &AppendTable {
        &self.scores
    }

    pub fn drift(&self) -> &AppendTable {
        &self.drift
    }
}

impl ResultSink for TableSink {
    fn write_batch(&mut self, index: BatchIndex, rows: &[ScoredRecord]) -> Result<()> {
        let run_id = index.to_string();
        let score_rows: Vec<[String; 4]> = rows
            .iter()
            .map(|row| {
                [
                    row.record.entity_id.to_string(),
                    format_score(row.record.score),
                    row.record.industry.clone(),
                    row.percentile.to_string(),
                ]
            })
            .collect();
        let drift_rows: Vec<[String; 3]> = rows
            .iter()
            .map(|row| {
                [
                    run_id.clone(),
                    row.record.entity_id.to_string(),
                    row.percentile.to_string(),
                ]
            })
            .collect();

        let mark = self.scores.byte_len()?;
        self.scores.append(&score_rows)?;
        if let Err(err) = self.drift.append(&drift_rows) {
            if let Err(undo) = self.scores.truncate_to(mark) {
                error!(
                    batch = %index,
                    path = %self.scores.path().display(),
                    error = %undo,
                    "could not remove scores rows of failed batch"
                );
            }
            return Err(err.into());
        }
        Ok(())
    }
}

/// Table format taken from the config's delimiter and quote character.
pub fn table_format(config: &EtlConfig) -> TableFormat {
    TableFormat::new(config.delimiter, config.quote_char)
}

/// Keeps every written batch in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub batches: Vec<(BatchIndex, Vec<ScoredRecord>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows written for batch `index`, if any.
    pub fn batch(&self, index: BatchIndex) -> Option<&[ScoredRecord]> {
        self.batches
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, rows)| rows.as_slice())
    }

    /// Every written row, in write order.
    pub fn rows(&self) -> impl Iterator<Item = &ScoredRecord> {
        self.batches.iter().flat_map(|(_, rows)| rows.iter())
    }
}

impl ResultSink for MemorySink {
    fn write_batch(&mut self, index: BatchIndex, rows: &[ScoredRecord]) -> Result<()> {
        self.batches.push((index, rows.to_vec()));
        Ok(())
    }
}
