//! Output surfaces handed to the presentation layer.
//!
//! Everything here is plain serializable data: the charting layer gets an
//! aggregated series with aligned anomaly labels, the tables get leak days
//! and summary statistics. Timestamps are rendered as strings so consumers
//! need no time library of their own.

use meter_domain::{AnomalyLabel, Granularity, LeakDay, SummaryStats};
use serde::Serialize;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date, PrimitiveDateTime};

use crate::pipeline::Selection;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

fn fmt_timestamp(ts: PrimitiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).unwrap_or_else(|_| ts.to_string())
}

fn fmt_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

/// One charted point: period label, aggregated value, anomaly verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub timestamp: String,
    pub value: f64,
    pub label: AnomalyLabel,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub building: String,
    pub granularity: Granularity,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeakDayRow {
    pub date: String,
    pub run_length: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeakTableView {
    pub building: String,
    pub days: Vec<LeakDayRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub building: String,
    pub granularity: Granularity,
    pub stats: SummaryStats,
}

/// Everything the presentation layer needs for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionView {
    pub chart: ChartView,
    pub leaks: LeakTableView,
    pub summary: SummaryView,
}

impl SelectionView {
    pub(crate) fn new(
        selection: &Selection,
        timestamps: &[PrimitiveDateTime],
        values: &[f64],
        labels: &[AnomalyLabel],
        leaks: &[LeakDay],
        stats: SummaryStats,
    ) -> Self {
        let points = timestamps
            .iter()
            .zip(values)
            .zip(labels)
            .map(|((&ts, &value), &label)| ChartPoint {
                timestamp: fmt_timestamp(ts),
                value,
                label,
            })
            .collect();

        let days = leaks
            .iter()
            .map(|day| LeakDayRow {
                date: fmt_date(day.date),
                run_length: day.run_length,
            })
            .collect();

        Self {
            chart: ChartView {
                building: selection.building.clone(),
                granularity: selection.granularity,
                points,
            },
            leaks: LeakTableView {
                building: selection.building.clone(),
                days,
            },
            summary: SummaryView {
                building: selection.building.clone(),
                granularity: selection.granularity,
                stats,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn timestamps_render_human_readable() {
        assert_eq!(fmt_timestamp(datetime!(2023-04-01 00:30)), "2023-04-01 00:30");
        assert_eq!(fmt_date(date!(2023-12-09)), "2023-12-09");
    }

    #[test]
    fn selection_view_aligns_points_and_labels() {
        let selection = Selection {
            building: "Bronte".to_string(),
            granularity: Granularity::Native,
            show_anomalies: true,
        };
        let timestamps = [datetime!(2023-04-01 00:00), datetime!(2023-04-01 00:30)];
        let values = [1.0, 9.0];
        let labels = [AnomalyLabel::Normal, AnomalyLabel::Anomalous];
        let leaks = [LeakDay {
            date: date!(2023-04-01),
            run_length: 5,
        }];

        let view = SelectionView::new(
            &selection,
            &timestamps,
            &values,
            &labels,
            &leaks,
            SummaryStats::describe(&values),
        );

        assert_eq!(view.chart.points.len(), 2);
        assert_eq!(view.chart.points[1].value, 9.0);
        assert_eq!(view.chart.points[1].label, AnomalyLabel::Anomalous);
        assert_eq!(view.leaks.days[0].date, "2023-04-01");
        assert_eq!(view.summary.stats.count, 2);

        let json = serde_json::to_string(&view).expect("serializable");
        assert!(json.contains("\"anomalous\""));
    }
}
