use std::{fs, time::SystemTime};

use meter_domain::CanonicalSeries;

use crate::{config::SourceConfig, pipeline::PipelineError, transform};

use super::WaterCsvFileSource;

/// Memoized canonical loader.
///
/// Parsing and interpolating the full export is the expensive step of a
/// session, so the result is cached and re-built only when the source file's
/// modification time changes.
pub struct CachedCanonicalSource {
    source: WaterCsvFileSource,
    buildings: Vec<String>,
    cached: Option<(SystemTime, CanonicalSeries)>,
}

impl CachedCanonicalSource {
    pub fn new(cfg: &SourceConfig) -> Self {
        Self {
            source: WaterCsvFileSource::new(cfg.path.clone(), cfg.skip_rows, cfg.buildings.len()),
            buildings: cfg.buildings.clone(),
            cached: None,
        }
    }

    pub fn load(&mut self) -> Result<&CanonicalSeries, PipelineError> {
        let modified = fs::metadata(self.source.path())
            .and_then(|m| m.modified())
            .map_err(|e| {
                PipelineError::Source(format!(
                    "failed to stat {}: {e}",
                    self.source.path().display()
                ))
            })?;

        let stale = match &self.cached {
            Some((seen, _)) => *seen != modified,
            None => true,
        };

        if stale {
            let rows = self.source.load()?;
            let series = transform::build_canonical(rows, self.buildings.clone())?;
            tracing::info!(
                rows = series.len(),
                buildings = self.buildings.len(),
                "canonical series loaded"
            );
            self.cached = Some((modified, series));
        }

        match &self.cached {
            Some((_, series)) => Ok(series),
            None => Err(PipelineError::Source(
                "canonical cache unexpectedly empty".to_string(),
            )),
        }
    }
}
