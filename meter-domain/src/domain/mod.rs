mod anomaly;
mod granularity;
mod leak;
mod series;

pub use anomaly::AnomalyLabel;
pub use granularity::Granularity;
pub use leak::LeakDay;
pub use series::{AggregatedSeries, CanonicalSeries, DomainError, SeriesTable, TOTAL_COLUMN};
