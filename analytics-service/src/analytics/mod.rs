//! The analytics core: resampling, anomaly scoring, leak-run detection, and
//! summary statistics over the canonical dataset.

pub mod anomaly;
pub mod leak;
pub mod resample;
pub mod summary;

pub use anomaly::AnomalyDetector;
pub use leak::{longest_run, LeakDetector};
pub use resample::{resample, resample_aggregated};
pub use summary::summarize;
