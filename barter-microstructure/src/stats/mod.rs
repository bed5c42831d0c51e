/// Summary statistics helpers.
pub mod calc;

/// Per-instrument rolling histories and z-score normalisation.
pub mod rolling;

pub use rolling::{Metric, RollingSeries, RollingStatTracker, ZScore};
