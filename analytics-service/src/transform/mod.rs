//! Normalization of raw loader rows into the canonical series.
//!
//! Rows arrive in file order with possible duplicates and NaN cells. This
//! module sorts them, drops duplicate timestamps (first wins), fills NaN
//! gaps per building by time-weighted linear interpolation, and assembles
//! the `CanonicalSeries` (which derives the `Total` column itself).

use meter_domain::CanonicalSeries;
use time::PrimitiveDateTime;

use crate::pipeline::PipelineError;

/// One parsed row from the raw export: a timestamp plus one reading per
/// configured building column, NaN where the cell was unparseable.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub ts: PrimitiveDateTime,
    pub values: Vec<f64>,
}

pub fn build_canonical(
    mut rows: Vec<RawRow>,
    buildings: Vec<String>,
) -> Result<CanonicalSeries, PipelineError> {
    let width = buildings.len();
    for row in &rows {
        if row.values.len() != width {
            return Err(PipelineError::Transform(format!(
                "row at {} has {} values, expected {}",
                row.ts,
                row.values.len(),
                width
            )));
        }
    }

    rows.sort_by_key(|r| r.ts);

    let mut duplicates = 0u64;
    rows.dedup_by(|next, kept| {
        let dup = next.ts == kept.ts;
        if dup {
            duplicates += 1;
        }
        dup
    });
    if duplicates > 0 {
        metrics::counter!("duplicate_timestamps_dropped_total").increment(duplicates);
        tracing::warn!(duplicates, "dropped rows with duplicate timestamps");
    }

    let timestamps: Vec<PrimitiveDateTime> = rows.iter().map(|r| r.ts).collect();
    let mut columns = vec![Vec::with_capacity(rows.len()); width];
    for row in &rows {
        for (column, value) in columns.iter_mut().zip(&row.values) {
            column.push(*value);
        }
    }

    for (name, column) in buildings.iter().zip(&mut columns) {
        interpolate_gaps(&timestamps, column, name);
    }

    Ok(CanonicalSeries::new(timestamps, buildings, columns)?)
}

/// Fills NaN entries of one column in place.
///
/// Interior gaps are interpolated linearly in time between the surrounding
/// readings; leading and trailing gaps take the nearest valid reading. A
/// column with no valid readings at all is zero-filled.
fn interpolate_gaps(timestamps: &[PrimitiveDateTime], values: &mut [f64], name: &str) {
    let valid: Vec<usize> = (0..values.len())
        .filter(|&i| values[i].is_finite())
        .collect();

    if valid.is_empty() {
        if !values.is_empty() {
            tracing::warn!(column = name, "no parseable readings, filling with zeros");
            values.fill(0.0);
        }
        return;
    }

    let first = valid[0];
    let last = valid[valid.len() - 1];
    for i in 0..first {
        values[i] = values[first];
    }
    for i in last + 1..values.len() {
        values[i] = values[last];
    }

    for pair in valid.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b == a + 1 {
            continue;
        }
        let (va, vb) = (values[a], values[b]);
        let span = (timestamps[b] - timestamps[a]).whole_seconds() as f64;
        for i in a + 1..b {
            let frac = (timestamps[i] - timestamps[a]).whole_seconds() as f64 / span;
            values[i] = va + (vb - va) * frac;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meter_domain::TOTAL_COLUMN;
    use time::macros::datetime;

    fn ts(n: i64) -> PrimitiveDateTime {
        datetime!(2023-04-01 00:00) + time::Duration::minutes(30 * n)
    }

    fn row(n: i64, values: Vec<f64>) -> RawRow {
        RawRow { ts: ts(n), values }
    }

    #[test]
    fn sorts_rows_and_derives_total() {
        let rows = vec![
            row(1, vec![2.0, 20.0]),
            row(0, vec![1.0, 10.0]),
            row(2, vec![3.0, 30.0]),
        ];
        let series =
            build_canonical(rows, vec!["Bronte".to_string(), "Fry".to_string()]).expect("valid");

        assert_eq!(series.timestamps(), &[ts(0), ts(1), ts(2)]);
        assert_eq!(series.column("Bronte"), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(series.column(TOTAL_COLUMN), Some(&[11.0, 22.0, 33.0][..]));
    }

    #[test]
    fn duplicate_timestamps_keep_first_row() {
        let rows = vec![
            row(0, vec![1.0]),
            row(1, vec![2.0]),
            row(1, vec![99.0]),
        ];
        let series = build_canonical(rows, vec!["Bronte".to_string()]).expect("valid");

        assert_eq!(series.len(), 2);
        assert_eq!(series.column("Bronte"), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn interior_gap_is_time_weighted() {
        // Reading at t0 and t3 (90 minutes apart); the two NaNs in between
        // sit at one third and two thirds of the way.
        let rows = vec![
            row(0, vec![3.0]),
            row(1, vec![f64::NAN]),
            row(2, vec![f64::NAN]),
            row(3, vec![6.0]),
        ];
        let series = build_canonical(rows, vec!["Bronte".to_string()]).expect("valid");
        let values = series.column("Bronte").expect("column exists");

        assert!((values[1] - 4.0).abs() < 1e-12);
        assert!((values[2] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn uneven_spacing_weights_by_elapsed_time() {
        // Valid readings 30 minutes then 60 minutes apart: the NaN at t1 is
        // one third of the way through the 90-minute gap in time.
        let rows = vec![
            RawRow { ts: ts(0), values: vec![0.0] },
            RawRow { ts: ts(1), values: vec![f64::NAN] },
            RawRow { ts: ts(3), values: vec![9.0] },
        ];
        let series = build_canonical(rows, vec!["Bronte".to_string()]).expect("valid");
        let values = series.column("Bronte").expect("column exists");

        assert!((values[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn edge_gaps_take_nearest_reading() {
        let rows = vec![
            row(0, vec![f64::NAN]),
            row(1, vec![5.0]),
            row(2, vec![f64::NAN]),
        ];
        let series = build_canonical(rows, vec!["Bronte".to_string()]).expect("valid");

        assert_eq!(series.column("Bronte"), Some(&[5.0, 5.0, 5.0][..]));
    }

    #[test]
    fn all_nan_column_is_zero_filled() {
        let rows = vec![row(0, vec![f64::NAN, 1.0]), row(1, vec![f64::NAN, 2.0])];
        let series =
            build_canonical(rows, vec!["Ghost".to_string(), "Fry".to_string()]).expect("valid");

        assert_eq!(series.column("Ghost"), Some(&[0.0, 0.0][..]));
        assert_eq!(series.column(TOTAL_COLUMN), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn ragged_row_is_a_transform_error() {
        let rows = vec![row(0, vec![1.0, 2.0])];
        let res = build_canonical(rows, vec!["Bronte".to_string()]);
        assert!(matches!(res, Err(PipelineError::Transform(_))));
    }

    #[test]
    fn empty_input_builds_empty_series() {
        let series = build_canonical(vec![], vec!["Bronte".to_string()]).expect("valid");
        assert!(series.is_empty());
    }
}
