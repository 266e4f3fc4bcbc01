//! Equal-frequency (quantile) binning.
//!
//! A fitted [`EqualFrequencyBins`] holds `bins + 1` edges taken at the
//! quantiles `i / bins`. Bins are closed on the right and the first bin is
//! also closed on the left, so every value of the fitted sample lands in
//! exactly one bin:
//!
//! ```text
//! bin 0:      [edge[0], edge[1]]
//! bin i > 0:  (edge[i], edge[i + 1]]
//! ```
//!
//! When edges coincide (fewer distinct values than bins) a value is given the
//! lowest bin whose right edge reaches it. Equal values therefore always share
//! a bin, bin indices never decrease as values increase, and the number of
//! bins that can actually be produced shrinks to what the data supports.

use super::quantile::{interpolate_at, sorted_finite};

/// Number of bins used for percentile ranks (labels 0..=99).
pub const PERCENTILE_BINS: usize = 100;

/// Bin edges fitted to one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualFrequencyBins {
    edges: Vec<f64>,
}

impl EqualFrequencyBins {
    /// Fit `bins` equal-frequency bins to the finite values of `values`.
    ///
    /// Returns `None` when `bins` is zero or the sample has no finite value.
    pub fn fit(values: &[f64], bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let sorted = sorted_finite(values);
        if sorted.is_empty() {
            return None;
        }
        let span = (sorted.len() - 1) as f64;
        let mut edges = Vec::with_capacity(bins + 1);
        let mut prev = f64::NEG_INFINITY;
        for i in 0..=bins {
            let pos = (i as f64 * span) / bins as f64;
            let edge = interpolate_at(&sorted, pos).max(prev);
            edges.push(edge);
            prev = edge;
        }
        Some(Self { edges })
    }

    /// Number of bins the edges describe.
    pub fn bin_count(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins some value can be assigned to.
    ///
    /// Equals [`bin_count`](Self::bin_count) unless edges coincide.
    pub fn reachable_bins(&self) -> usize {
        1 + self.edges[1..]
            .windows(2)
            .filter(|pair| pair[0] < pair[1])
            .count()
    }

    /// Bin index of `x`, or `None` if `x` is NaN or outside the fitted range.
    pub fn assign(&self, x: f64) -> Option<usize> {
        let (first, last) = (self.edges[0], self.edges[self.edges.len() - 1]);
        if x.is_nan() || x < first || x > last {
            return None;
        }
        Some(self.edges[1..].partition_point(|edge| *edge < x))
    }
}

/// Bin every value of `values` against bins fitted to the same sample.
///
/// Entries that are NaN or infinite map to `None`.
pub fn qcut(values: &[f64], bins: usize) -> Vec<Option<usize>> {
    match EqualFrequencyBins::fit(values, bins) {
        Some(fitted) => values.iter().map(|x| fitted.assign(*x)).collect(),
        None => vec![None; values.len()],
    }
}
