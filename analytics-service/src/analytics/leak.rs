//! Nighttime leak detection on the native 30-minute series.
//!
//! Sustained nonzero flow in the small hours, when normal usage should be
//! near zero, is a much stronger leak signal than a single noisy reading.
//! The detector therefore requires a minimum run of consecutive
//! over-threshold intervals before reporting a day.

use std::collections::BTreeMap;

use meter_domain::{CanonicalSeries, LeakDay};
use time::{macros::time, Date, Time};

use crate::{config::LeakConfig, pipeline::PipelineError};

pub const DEFAULT_WINDOW_START: Time = time!(00:00);
pub const DEFAULT_WINDOW_END: Time = time!(04:00);
pub const DEFAULT_FLOW_THRESHOLD: f64 = 0.05;
pub const DEFAULT_MIN_RUN: u32 = 4;

#[derive(Debug, Clone)]
pub struct LeakDetector {
    window_start: Time,
    window_end: Time,
    flow_threshold: f64,
    min_run: u32,
}

impl Default for LeakDetector {
    fn default() -> Self {
        Self {
            window_start: DEFAULT_WINDOW_START,
            window_end: DEFAULT_WINDOW_END,
            flow_threshold: DEFAULT_FLOW_THRESHOLD,
            min_run: DEFAULT_MIN_RUN,
        }
    }
}

impl LeakDetector {
    pub fn from_config(cfg: &LeakConfig) -> Self {
        Self {
            window_start: cfg.window_start,
            window_end: cfg.window_end,
            flow_threshold: cfg.flow_threshold,
            min_run: cfg.min_run,
        }
    }

    /// Scans one building's native series and returns the days whose
    /// longest nightly over-threshold run meets the minimum, in date order.
    ///
    /// The window is `[start, end)` within a single calendar day; a window
    /// crossing midnight matches nothing. Days with no samples in the
    /// window contribute no entry at all, which keeps "no data" distinct
    /// from "a genuine zero run".
    pub fn detect(
        &self,
        series: &CanonicalSeries,
        building: &str,
    ) -> Result<Vec<LeakDay>, PipelineError> {
        let values = series.column(building).ok_or_else(|| {
            PipelineError::Selection(format!("unknown building '{building}'"))
        })?;

        let mut nights: BTreeMap<Date, Vec<bool>> = BTreeMap::new();
        for (ts, value) in series.timestamps().iter().zip(values) {
            let t = ts.time();
            if t >= self.window_start && t < self.window_end {
                nights
                    .entry(ts.date())
                    .or_default()
                    .push(*value > self.flow_threshold);
            }
        }

        Ok(nights
            .into_iter()
            .filter_map(|(date, flags)| {
                let run_length = longest_run(flags);
                (run_length >= self.min_run).then_some(LeakDay { date, run_length })
            })
            .collect())
    }
}

/// Longest contiguous run of `true` flags: a linear scan with a running
/// counter that resets on every `false`.
pub fn longest_run<I>(flags: I) -> u32
where
    I: IntoIterator<Item = bool>,
{
    let mut run = 0u32;
    let mut best = 0u32;
    for flag in flags {
        run = if flag { run + 1 } else { 0 };
        best = best.max(run);
    }
    best
}
