//! Per-industry percentile ranks over the window.
//!
//! Ranks are computed only once batches 0, 1 and 2 have all been seen. From
//! then on each recognized industry gets its own equal-frequency binning over
//! every non-missing score in the window (up to three batches), and the
//! records of the current batch are labeled with their bin. Industries never
//! share bins.

use std::collections::HashMap;

use tracing::debug;

use sd_common::{BatchIndex, Error, Result};
use sd_config::IndustrySet;
use sd_math::{EqualFrequencyBins, PERCENTILE_BINS};

use crate::record::{Percentile, ScoredRecord};
use crate::window::{Window, WINDOW_BATCHES};

/// First batch index for which percentiles are computed.
pub const MIN_HISTORY_INDEX: BatchIndex = BatchIndex(2);

/// Assigns percentiles to the records of the current batch.
#[derive(Debug, Clone)]
pub struct PercentileTransformer {
    industries: IndustrySet,
}

impl PercentileTransformer {
    pub fn new(industries: IndustrySet) -> Self {
        Self { industries }
    }

    pub fn industries(&self) -> &IndustrySet {
        &self.industries
    }

    /// Rank the records of batch `current` against the whole window.
    ///
    /// Returns the current batch's records in load order. Records of older
    /// batches are context only and are never returned or modified.
    pub fn transform(&self, window: &Window, current: BatchIndex) -> Result<Vec<ScoredRecord>> {
        check_window(window, current)?;
        let Some(slice) = window.batch(current) else {
            return Err(Error::malformed(
                current.0,
                "current batch is not in the window",
            ));
        };

        if current < MIN_HISTORY_INDEX {
            return Ok(slice
                .records
                .iter()
                .map(|record| ScoredRecord {
                    record: record.clone(),
                    percentile: Percentile::NotComputed,
                })
                .collect());
        }

        let bins = self.fit_industries(window, current);
        let scored = slice
            .records
            .iter()
            .map(|record| {
                let percentile = match (bins.get(record.industry.as_str()), record.score) {
                    (Some(fitted), Some(score)) => fitted
                        .assign(score)
                        .and_then(Percentile::from_bin)
                        .unwrap_or(Percentile::NotComputed),
                    _ => Percentile::NotComputed,
                };
                ScoredRecord {
                    record: record.clone(),
                    percentile,
                }
            })
            .collect();
        Ok(scored)
    }

    /// One independent binning per recognized industry with at least one score.
    fn fit_industries<'a>(
        &'a self,
        window: &Window,
        current: BatchIndex,
    ) -> HashMap<&'a str, EqualFrequencyBins> {
        let mut scores: HashMap<&str, Vec<f64>> =
            self.industries.iter().map(|label| (label, Vec::new())).collect();
        for record in window.records() {
            if let (Some(bucket), Some(score)) =
                (scores.get_mut(record.industry.as_str()), record.score)
            {
                bucket.push(score);
            }
        }

        let mut fitted = HashMap::with_capacity(scores.len());
        for label in self.industries.iter() {
            let Some(values) = scores.get(label) else {
                continue;
            };
            if let Some(bins) = EqualFrequencyBins::fit(values, PERCENTILE_BINS) {
                let reachable = bins.reachable_bins();
                if reachable < PERCENTILE_BINS {
                    debug!(
                        batch = %current,
                        industry = label,
                        scores = values.len(),
                        reachable,
                        "too few distinct scores for every percentile bin"
                    );
                }
                fitted.insert(label, bins);
            }
        }
        fitted
    }
}

/// Every retained batch must lie in `[current - 2, current]`.
fn check_window(window: &Window, current: BatchIndex) -> Result<()> {
    let floor = current.window_floor(WINDOW_BATCHES);
    for slice in window.slices() {
        if slice.index < floor || slice.index > current {
            return Err(Error::malformed(
                current.0,
                format!(
                    "window holds batch {} outside [{floor}, {current}]",
                    slice.index
                ),
            ));
        }
        if let Some(stray) = slice.records.iter().find(|r| r.batch_index != slice.index) {
            return Err(Error::malformed(
                current.0,
                format!(
                    "record {} stamped with batch {} filed under batch {}",
                    stray.entity_id, stray.batch_index, slice.index
                ),
            ));
        }
    }
    Ok(())
}
