//! Batch loading: fetch, normalize, stamp, merge into the window.

use serde_json::Value;
use tracing::{debug, warn};

use sd_common::{BatchIndex, EntityId, Error, Result};

use crate::record::{parse_score, RawRecord, Record};
use crate::source::BatchSource;
use crate::window::{BatchSlice, Window};

/// A freshly loaded batch.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedBatch {
    pub index: BatchIndex,
    pub records: Vec<Record>,
    /// Scores that were present but unreadable and were replaced by a
    /// missing value.
    pub score_failures: usize,
}

/// Outcome of merging a loaded batch into the window.
#[derive(Debug)]
pub struct Merge {
    pub records: usize,
    pub score_failures: usize,
    /// Batches dropped from the window to make room.
    pub evicted: Vec<BatchSlice>,
}

impl Merge {
    pub fn evicted_records(&self) -> usize {
        self.evicted.iter().map(|slice| slice.records.len()).sum()
    }
}

/// Reads batches from a [`BatchSource`] and turns them into [`Record`]s.
#[derive(Debug, Clone)]
pub struct BatchLoader<S> {
    source: S,
}

impl<S: BatchSource> BatchLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and normalize batch `index`.
    ///
    /// Unreadable scores become missing scores. A row without an `id` or an
    /// `industry` fails the whole batch with [`Error::MalformedRecord`].
    pub fn load(&self, index: BatchIndex) -> Result<LoadedBatch> {
        let raw = self.source.fetch(index)?;
        let mut records = Vec::with_capacity(raw.len());
        let mut score_failures = 0usize;

        for (pos, row) in raw.iter().enumerate() {
            let (record, score_ok) = normalize(row, index, pos)?;
            if !score_ok {
                score_failures += 1;
            }
            records.push(record);
        }

        if score_failures > 0 {
            warn!(
                batch = %index,
                count = score_failures,
                "unparseable scores treated as missing"
            );
        }
        Ok(LoadedBatch {
            index,
            records,
            score_failures,
        })
    }

    /// Load batch `index` and admit it into `window`.
    ///
    /// The returned [`Merge`] carries the evicted batches so the caller can
    /// [`Window::revert`] if a later step fails.
    pub fn load_into(&self, window: &mut Window, index: BatchIndex) -> Result<Merge> {
        let loaded = self.load(index)?;
        let records = loaded.records.len();
        let evicted = window.admit(BatchSlice::new(index, loaded.records))?;
        Ok(Merge {
            records,
            score_failures: loaded.score_failures,
            evicted,
        })
    }
}

/// Normalize one raw row. The flag is `false` when the score was present but
/// unreadable.
fn normalize(row: &RawRecord, index: BatchIndex, pos: usize) -> Result<(Record, bool)> {
    let entity_id = match row.get("id") {
        Some(Value::String(s)) => EntityId(s.clone()),
        Some(Value::Number(n)) => EntityId(n.to_string()),
        Some(Value::Null) | None => {
            return Err(Error::malformed(index.0, format!("row {pos} has no `id`")))
        }
        Some(other) => {
            return Err(Error::malformed(
                index.0,
                format!("row {pos} has a non-scalar `id`: {other}"),
            ))
        }
    };

    let industry = match row.get("industry") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => {
            return Err(Error::malformed(
                index.0,
                format!("row {pos} ({entity_id}) has no `industry`"),
            ))
        }
        Some(other) => {
            return Err(Error::malformed(
                index.0,
                format!("row {pos} ({entity_id}) has a non-string `industry`: {other}"),
            ))
        }
    };

    let (score, score_ok) = match parse_score(row.get("score")) {
        Ok(score) => (score, true),
        Err(failure) => {
            debug!(batch = %index, id = %entity_id, %failure, "score replaced by missing value");
            (None, false)
        }
    };

    Ok((
        Record {
            entity_id,
            score,
            industry,
            batch_index: index,
        },
        score_ok,
    ))
}
