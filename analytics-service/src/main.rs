use anyhow::Result;
use meter_domain::Granularity;

use analytics_service::{
    config::AppConfig,
    observability,
    pipeline::{self, Selection},
    sources::CachedCanonicalSource,
};

fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    // Optional CLI overrides: analytics-service [building] [granularity]
    let args: Vec<String> = std::env::args().collect();
    let mut selection = Selection {
        building: cfg.selection.building.clone(),
        granularity: cfg.selection.granularity,
        show_anomalies: cfg.selection.show_anomalies,
    };
    if let Some(building) = args.get(1) {
        selection.building = building.clone();
    }
    if let Some(granularity) = args.get(2) {
        selection.granularity = granularity.parse::<Granularity>()?;
    }

    let mut loader = CachedCanonicalSource::new(&cfg.source);
    let series = loader.load()?;
    let view = pipeline::evaluate(series, &selection, &cfg)?;

    tracing::info!(
        rows = series.len(),
        building = %selection.building,
        granularity = %selection.granularity,
        chart_points = view.chart.points.len(),
        leak_days = view.leaks.days.len(),
        "selection evaluated"
    );

    println!("{}", serde_json::to_string_pretty(&view)?);

    Ok(())
}
