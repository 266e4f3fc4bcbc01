//! The batch pipeline: load → merge → transform → write, one index at a time.

use serde::Serialize;
use tracing::{debug, info};

use sd_common::{BatchIndex, Error, Result};
use sd_config::EtlConfig;

use crate::loader::BatchLoader;
use crate::record::ScoredRecord;
use crate::sink::ResultSink;
use crate::source::BatchSource;
use crate::transform::PercentileTransformer;
use crate::window::{Window, WINDOW_BATCHES};

/// What happened to one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub index: BatchIndex,
    pub records: usize,
    /// Records whose score was present but unreadable.
    pub score_failures: usize,
    /// Records that received a 0–99 rank.
    pub ranked: usize,
    /// Records written with the sentinel.
    pub not_computed: usize,
    /// Records dropped from the window before this batch was ranked.
    pub evicted: usize,
}

/// Totals over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub batches: Vec<BatchReport>,
}

impl RunSummary {
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn records(&self) -> usize {
        self.batches.iter().map(|b| b.records).sum()
    }

    pub fn ranked(&self) -> usize {
        self.batches.iter().map(|b| b.ranked).sum()
    }

    pub fn score_failures(&self) -> usize {
        self.batches.iter().map(|b| b.score_failures).sum()
    }
}

/// Owns the window and drives batches through loader, transformer and sink.
///
/// Batches must be processed in strictly increasing, gap-free order. A batch
/// that fails anywhere leaves the window exactly as it was before the batch,
/// the sink drops whatever it wrote for it, and the same index can be
/// retried.
pub struct Pipeline<S, K> {
    loader: BatchLoader<S>,
    transformer: PercentileTransformer,
    sink: K,
    window: Window,
    next_index: BatchIndex,
}

impl<S: BatchSource, K: ResultSink> Pipeline<S, K> {
    pub fn new(config: &EtlConfig, source: S, sink: K) -> Self {
        Self {
            loader: BatchLoader::new(source),
            transformer: PercentileTransformer::new(config.industries.clone()),
            sink,
            window: Window::new(),
            next_index: BatchIndex(0),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Index the pipeline expects next.
    pub fn next_index(&self) -> BatchIndex {
        self.next_index
    }

    /// Run batches `0..total_batches`.
    pub fn process(&mut self, total_batches: u64) -> Result<RunSummary> {
        self.process_range(BatchIndex(0), BatchIndex(total_batches))
    }

    /// Run batches `start..end`.
    ///
    /// A fresh pipeline asked to start past 0 first rebuilds its window from
    /// the two preceding batches without writing anything, so the rows it
    /// appends match an uninterrupted run.
    pub fn process_range(&mut self, start: BatchIndex, end: BatchIndex) -> Result<RunSummary> {
        if start != self.next_index {
            if self.next_index == BatchIndex(0) && self.window.batch_count() == 0 {
                self.warm(start)?;
            } else {
                return Err(Error::OutOfOrder {
                    expected: self.next_index.0,
                    got: start.0,
                });
            }
        }

        let mut summary = RunSummary::default();
        let mut index = start;
        while index < end {
            summary.batches.push(self.process_batch(index)?);
            index = index.next();
        }
        info!(
            batches = summary.batch_count(),
            records = summary.records(),
            ranked = summary.ranked(),
            "run complete"
        );
        Ok(summary)
    }

    /// Load batches `start - 2 .. start` into the window without ranking or
    /// writing them.
    pub fn warm(&mut self, start: BatchIndex) -> Result<()> {
        if self.next_index != BatchIndex(0) || self.window.batch_count() != 0 {
            return Err(Error::OutOfOrder {
                expected: self.next_index.0,
                got: start.0,
            });
        }
        let mut index = start.window_floor(WINDOW_BATCHES);
        while index < start {
            self.loader.load_into(&mut self.window, index)?;
            debug!(batch = %index, "window warmed");
            index = index.next();
        }
        self.next_index = start;
        Ok(())
    }

    /// Run one batch. `index` must be [`Pipeline::next_index`].
    pub fn process_batch(&mut self, index: BatchIndex) -> Result<BatchReport> {
        if index != self.next_index {
            return Err(Error::OutOfOrder {
                expected: self.next_index.0,
                got: index.0,
            });
        }

        let merge = self.loader.load_into(&mut self.window, index)?;
        let evicted_records = merge.evicted_records();

        let rows = match self.rank_and_write(index) {
            Ok(rows) => rows,
            Err(err) => {
                self.window.revert(merge.evicted);
                return Err(err);
            }
        };

        let ranked = rows.iter().filter(|r| r.percentile.is_computed()).count();
        let report = BatchReport {
            index,
            records: merge.records,
            score_failures: merge.score_failures,
            ranked,
            not_computed: rows.len() - ranked,
            evicted: evicted_records,
        };
        info!(
            batch = %index,
            records = report.records,
            ranked = report.ranked,
            not_computed = report.not_computed,
            window_batches = self.window.batch_count(),
            "batch processed"
        );
        self.next_index = index.next();
        Ok(report)
    }

    fn rank_and_write(&mut self, index: BatchIndex) -> Result<Vec<ScoredRecord>> {
        let rows = self.transformer.transform(&self.window, index)?;
        self.sink.write_batch(index, &rows)?;
        Ok(rows)
    }
}
