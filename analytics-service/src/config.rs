use serde::{Deserialize, Deserializer};
use std::{fs, path::PathBuf};
use time::{macros::format_description, Time};

use meter_domain::{Granularity, TOTAL_COLUMN};

use crate::analytics::{anomaly, leak};

/// Location and shape of the raw meter export.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Preamble rows before the first data row.
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
    /// Building column names, in file order after the date and time columns.
    pub buildings: Vec<String>,
}

fn default_skip_rows() -> usize {
    16
}

/// Default selection evaluated when the caller passes nothing else.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub building: String,
    pub granularity: Granularity,
    pub show_anomalies: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            building: TOTAL_COLUMN.to_string(),
            granularity: Granularity::Daily,
            show_anomalies: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Expected fraction of anomalous points.
    pub contamination: f64,
    /// Seed for the isolation forest; fixed for reproducible labels.
    pub seed: u64,
    pub trees: usize,
    pub subsample: usize,
    /// Below this many points detection is skipped entirely.
    pub min_samples: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            contamination: anomaly::DEFAULT_CONTAMINATION,
            seed: anomaly::DEFAULT_SEED,
            trees: anomaly::DEFAULT_TREES,
            subsample: anomaly::DEFAULT_SUBSAMPLE,
            min_samples: anomaly::DEFAULT_MIN_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeakConfig {
    /// Start of the nightly window, inclusive ("HH:MM").
    #[serde(deserialize_with = "de_time")]
    pub window_start: Time,
    /// End of the nightly window, exclusive ("HH:MM").
    #[serde(deserialize_with = "de_time")]
    pub window_end: Time,
    /// Per-interval consumption above this counts toward a run.
    pub flow_threshold: f64,
    /// Minimum run length for a day to be reported.
    pub min_run: u32,
}

impl Default for LeakConfig {
    fn default() -> Self {
        Self {
            window_start: leak::DEFAULT_WINDOW_START,
            window_end: leak::DEFAULT_WINDOW_END,
            flow_threshold: leak::DEFAULT_FLOW_THRESHOLD,
            min_run: leak::DEFAULT_MIN_RUN,
        }
    }
}

fn de_time<'de, D>(deserializer: D) -> Result<Time, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Time::parse(&s, format_description!("[hour]:[minute]"))
        .map_err(|e| serde::de::Error::custom(format!("invalid time '{s}': {e}")))
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub leak: LeakConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path =
            env::var("ANALYTICS_CONFIG").unwrap_or_else(|_| "analytics-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::time;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [source]
            path = "Water.csv"
            buildings = ["Bronte", "Fry"]
            "#,
        )
        .expect("valid config");

        assert_eq!(cfg.source.skip_rows, 16);
        assert_eq!(cfg.selection.building, TOTAL_COLUMN);
        assert_eq!(cfg.selection.granularity, Granularity::Daily);
        assert!(cfg.selection.show_anomalies);
        assert_eq!(cfg.anomaly.contamination, 0.02);
        assert_eq!(cfg.anomaly.seed, 42);
        assert_eq!(cfg.leak.window_start, time!(00:00));
        assert_eq!(cfg.leak.window_end, time!(04:00));
        assert_eq!(cfg.leak.flow_threshold, 0.05);
        assert_eq!(cfg.leak.min_run, 4);
    }

    #[test]
    fn leak_window_parses_from_strings() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [source]
            path = "Water.csv"
            buildings = ["Bronte"]

            [leak]
            window_start = "01:30"
            window_end = "05:00"
            min_run = 6
            "#,
        )
        .expect("valid config");

        assert_eq!(cfg.leak.window_start, time!(01:30));
        assert_eq!(cfg.leak.window_end, time!(05:00));
        assert_eq!(cfg.leak.min_run, 6);
        // untouched field keeps its default
        assert_eq!(cfg.leak.flow_threshold, 0.05);
    }

    #[test]
    fn malformed_leak_window_is_rejected() {
        let res: Result<AppConfig, _> = toml::from_str(
            r#"
            [source]
            path = "Water.csv"
            buildings = ["Bronte"]

            [leak]
            window_start = "quarter past"
            "#,
        );
        assert!(res.is_err());
    }
}
