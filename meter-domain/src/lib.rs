pub mod domain;
pub mod stats;

pub use domain::{
    AggregatedSeries, AnomalyLabel, CanonicalSeries, DomainError, Granularity, LeakDay,
    SeriesTable, TOTAL_COLUMN,
};
pub use stats::SummaryStats;
