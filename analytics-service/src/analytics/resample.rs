//! Calendar resampling of the wide series by summation.

use meter_domain::{AggregatedSeries, CanonicalSeries, Granularity, SeriesTable};
use time::{util, Date, Duration, PrimitiveDateTime, Time};

use crate::pipeline::PipelineError;

/// Resamples the canonical series to the requested granularity, summing
/// every column (including `Total`) within each calendar period.
///
/// Partial leading and trailing periods are kept with only the data they
/// contain; an empty input yields an empty output.
pub fn resample(
    series: &CanonicalSeries,
    granularity: Granularity,
) -> Result<AggregatedSeries, PipelineError> {
    Ok(AggregatedSeries::new(
        granularity,
        resample_table(series.table(), granularity)?,
    ))
}

/// Resamples an already-aggregated series again. Aggregating to the period
/// it already has returns it unchanged.
pub fn resample_aggregated(
    series: &AggregatedSeries,
    granularity: Granularity,
) -> Result<AggregatedSeries, PipelineError> {
    Ok(AggregatedSeries::new(
        granularity,
        resample_table(series.table(), granularity)?,
    ))
}

fn resample_table(
    table: &SeriesTable,
    granularity: Granularity,
) -> Result<SeriesTable, PipelineError> {
    if granularity == Granularity::Native {
        return Ok(table.clone());
    }

    let timestamps = table.timestamps();
    let names = table.names().to_vec();
    let mut out_timestamps = Vec::new();
    let mut out_columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    // Period labels are monotone over increasing timestamps, so each period
    // is one contiguous slice of rows.
    let mut i = 0;
    while i < timestamps.len() {
        let label = period_label(timestamps[i], granularity);
        let mut j = i;
        while j < timestamps.len() && period_label(timestamps[j], granularity) == label {
            j += 1;
        }
        out_timestamps.push(label);
        for (out, (_, column)) in out_columns.iter_mut().zip(table.columns()) {
            out.push(column[i..j].iter().sum());
        }
        i = j;
    }

    SeriesTable::new(out_timestamps, names, out_columns)
        .map_err(|e| PipelineError::Transform(e.to_string()))
}

/// Label of the calendar period containing `ts`: midnight of the day, the
/// Sunday ending the week, or the last day of the month.
fn period_label(ts: PrimitiveDateTime, granularity: Granularity) -> PrimitiveDateTime {
    let date = ts.date();
    let label = match granularity {
        Granularity::Native => return ts,
        Granularity::Daily => date,
        Granularity::Weekly => {
            let to_sunday = (7 - date.weekday().number_days_from_sunday() as i64) % 7;
            date + Duration::days(to_sunday)
        }
        Granularity::Monthly => month_end(date),
    };
    PrimitiveDateTime::new(label, Time::MIDNIGHT)
}

fn month_end(date: Date) -> Date {
    let last = util::days_in_year_month(date.year(), date.month());
    date.replace_day(last).expect("valid last day of month")
}
