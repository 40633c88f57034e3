mod cached;
mod water_csv_file;

pub use cached::CachedCanonicalSource;
pub use water_csv_file::WaterCsvFileSource;
