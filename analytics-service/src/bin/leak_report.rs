use anyhow::Result;

use analytics_service::{
    analytics::LeakDetector,
    config::AppConfig,
    observability,
    sources::CachedCanonicalSource,
};

/// Scans every building for suspected leak days and logs the findings.
fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    let mut loader = CachedCanonicalSource::new(&cfg.source);
    let series = loader.load()?;
    let detector = LeakDetector::from_config(&cfg.leak);

    let mut total_days = 0usize;
    for building in series.building_names() {
        let days = detector.detect(series, building)?;
        if days.is_empty() {
            continue;
        }
        total_days += days.len();
        for day in &days {
            tracing::info!(
                building = %building,
                date = %day.date,
                run_length = day.run_length,
                "suspected leak day"
            );
        }
    }

    tracing::info!(
        buildings = series.building_names().len(),
        suspected_days = total_days,
        min_run = cfg.leak.min_run,
        "leak report complete"
    );

    Ok(())
}
