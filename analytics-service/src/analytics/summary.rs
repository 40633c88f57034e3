//! Summary statistics for the selected building at the active granularity.

use meter_domain::{AggregatedSeries, SummaryStats};

use crate::pipeline::PipelineError;

pub fn summarize(series: &AggregatedSeries, building: &str) -> Result<SummaryStats, PipelineError> {
    let values = series
        .column(building)
        .ok_or_else(|| PipelineError::Selection(format!("unknown building '{building}'")))?;
    Ok(SummaryStats::describe(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::resample;
    use meter_domain::{CanonicalSeries, Granularity};
    use time::macros::datetime;

    #[test]
    fn summarizes_the_selected_column_only() {
        let timestamps = (0..4)
            .map(|i| datetime!(2023-04-01 00:00) + time::Duration::minutes(30 * i))
            .collect();
        let series = CanonicalSeries::new(
            timestamps,
            vec!["Bronte".to_string(), "Fry".to_string()],
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![100.0, 100.0, 100.0, 100.0]],
        )
        .expect("valid series");
        let native = resample(&series, Granularity::Native).expect("resample succeeds");

        let stats = summarize(&native, "Bronte").expect("known building");
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 2.5).abs() < 1e-12);

        let res = summarize(&native, "Atrium");
        assert!(matches!(res, Err(PipelineError::Selection(_))));
    }
}
