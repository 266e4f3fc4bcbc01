//! Sliding window over the most recent batches.
//!
//! The window holds at most [`WINDOW_BATCHES`] consecutive batches, oldest
//! first. Admitting batch `n` evicts every batch older than `n - 2`, so
//! records from stale batches can never reach the percentile computation.

use std::collections::VecDeque;

use sd_common::{BatchIndex, Error, Result};

use crate::record::Record;

/// Number of batches (current plus two preceding) kept for context.
pub const WINDOW_BATCHES: u64 = 3;

/// All records of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSlice {
    pub index: BatchIndex,
    pub records: Vec<Record>,
}

impl BatchSlice {
    pub fn new(index: BatchIndex, records: Vec<Record>) -> Self {
        Self { index, records }
    }
}

/// Bounded, index-ordered container of recent batches.
#[derive(Debug, Clone, Default)]
pub struct Window {
    slices: VecDeque<BatchSlice>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every batch older than `current - 2`.
    ///
    /// A no-op while `current <= 2`. Returns the evicted batches, oldest
    /// first.
    pub fn retain(&mut self, current: BatchIndex) -> Vec<BatchSlice> {
        let floor = current.window_floor(WINDOW_BATCHES);
        let mut evicted = Vec::new();
        while self.slices.front().is_some_and(|slice| slice.index < floor) {
            if let Some(slice) = self.slices.pop_front() {
                evicted.push(slice);
            }
        }
        evicted
    }

    /// Evict stale batches, then append `slice` as the newest batch.
    ///
    /// Fails with [`Error::OutOfOrder`] unless `slice.index` is newer than
    /// every retained batch. Returns what was evicted so a failed batch can
    /// be rolled back with [`Window::revert`].
    pub fn admit(&mut self, slice: BatchSlice) -> Result<Vec<BatchSlice>> {
        if let Some(newest) = self.newest() {
            if slice.index <= newest {
                return Err(Error::OutOfOrder {
                    expected: newest.next().0,
                    got: slice.index.0,
                });
            }
        }
        let evicted = self.retain(slice.index);
        self.slices.push_back(slice);
        Ok(evicted)
    }

    /// Undo the last [`Window::admit`]: drop the newest batch and restore
    /// the batches it evicted.
    pub fn revert(&mut self, evicted: Vec<BatchSlice>) -> Option<BatchSlice> {
        let newest = self.slices.pop_back();
        for slice in evicted.into_iter().rev() {
            self.slices.push_front(slice);
        }
        newest
    }

    pub fn batch(&self, index: BatchIndex) -> Option<&BatchSlice> {
        self.slices.iter().find(|slice| slice.index == index)
    }

    pub fn slices(&self) -> impl Iterator<Item = &BatchSlice> {
        self.slices.iter()
    }

    /// Every retained record, oldest batch first.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.slices.iter().flat_map(|slice| slice.records.iter())
    }

    pub fn batch_indices(&self) -> Vec<BatchIndex> {
        self.slices.iter().map(|slice| slice.index).collect()
    }

    pub fn newest(&self) -> Option<BatchIndex> {
        self.slices.back().map(|slice| slice.index)
    }

    pub fn batch_count(&self) -> usize {
        self.slices.len()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.slices.iter().map(|slice| slice.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.iter().all(|slice| slice.records.is_empty())
    }
}
