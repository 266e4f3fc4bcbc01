//! Score Drift math utilities.

pub mod math;

pub use math::binning::*;
pub use math::quantile::*;
