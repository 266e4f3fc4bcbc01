//! Sample quantiles with linear interpolation between closest ranks.
//!
//! For a sorted sample `x[0..n]` and `q` in `[0, 1]` the quantile sits at
//! fractional position `pos = q * (n - 1)` and is interpolated between
//! `x[floor(pos)]` and `x[ceil(pos)]`. This is the "linear" (type 7)
//! definition used by most statistics packages.

/// Sort finite values ascending, dropping NaN and infinities.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Value at fractional rank `pos` of an ascending sample.
///
/// The result never leaves `[x[floor], x[ceil]]`, so a sequence of
/// increasing positions yields a non-decreasing sequence of values.
pub(crate) fn interpolate_at(sorted: &[f64], pos: f64) -> f64 {
    let last = sorted.len() - 1;
    let lo = (pos.floor() as usize).min(last);
    let hi = (pos.ceil() as usize).min(last);
    let (a, b) = (sorted[lo], sorted[hi]);
    if lo == hi || a == b {
        return a;
    }
    let frac = pos - lo as f64;
    (a + (b - a) * frac).clamp(a, b)
}
