use time::PrimitiveDateTime;

use super::Granularity;

/// Name of the derived whole-site column appended after the building columns.
pub const TOTAL_COLUMN: &str = "Total";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("timestamps must be strictly increasing (violation at row {0})")]
    UnorderedTimestamps(usize),
    #[error("column '{name}' has {got} values, expected {expected}")]
    ColumnLengthMismatch {
        name: String,
        got: usize,
        expected: usize,
    },
    #[error("{got} value columns for {expected} column names")]
    ColumnCountMismatch { got: usize, expected: usize },
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("unknown granularity '{0}'")]
    UnknownGranularity(String),
}

/// Wide time-indexed table: one row per timestamp, one value column per name.
///
/// Storage is column-major so a per-building series can be handed out as a
/// slice without copying. Timestamps are strictly increasing; the
/// constructor rejects anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    timestamps: Vec<PrimitiveDateTime>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl SeriesTable {
    pub fn new(
        timestamps: Vec<PrimitiveDateTime>,
        names: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, DomainError> {
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(DomainError::UnorderedTimestamps(i));
            }
        }
        if names.len() != columns.len() {
            return Err(DomainError::ColumnCountMismatch {
                got: columns.len(),
                expected: names.len(),
            });
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(DomainError::DuplicateColumn(name.clone()));
            }
        }
        for (name, column) in names.iter().zip(&columns) {
            if column.len() != timestamps.len() {
                return Err(DomainError::ColumnLengthMismatch {
                    name: name.clone(),
                    got: column.len(),
                    expected: timestamps.len(),
                });
            }
        }
        Ok(Self {
            timestamps,
            names,
            columns,
        })
    }

    /// Number of rows (timestamps).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[PrimitiveDateTime] {
        &self.timestamps
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(&self.columns[idx])
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }
}

/// The fully cleaned, gap-interpolated, time-indexed table of per-building
/// readings plus a derived `Total` column.
///
/// Built once at load time and immutable for the rest of the session. The
/// constructor computes `Total` itself, so the "total equals the row sum"
/// invariant holds by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSeries {
    table: SeriesTable,
}

impl CanonicalSeries {
    /// Builds the canonical series from building columns only; the `Total`
    /// column is derived here. `TOTAL_COLUMN` is reserved and rejected as a
    /// building name.
    pub fn new(
        timestamps: Vec<PrimitiveDateTime>,
        buildings: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, DomainError> {
        if buildings.iter().any(|b| b == TOTAL_COLUMN) {
            return Err(DomainError::DuplicateColumn(TOTAL_COLUMN.to_string()));
        }
        if buildings.len() != columns.len() {
            return Err(DomainError::ColumnCountMismatch {
                got: columns.len(),
                expected: buildings.len(),
            });
        }
        for (name, column) in buildings.iter().zip(&columns) {
            if column.len() != timestamps.len() {
                return Err(DomainError::ColumnLengthMismatch {
                    name: name.clone(),
                    got: column.len(),
                    expected: timestamps.len(),
                });
            }
        }

        let mut totals = vec![0.0; timestamps.len()];
        for column in &columns {
            for (total, value) in totals.iter_mut().zip(column) {
                *total += value;
            }
        }

        let mut names = buildings;
        names.push(TOTAL_COLUMN.to_string());
        let mut columns = columns;
        columns.push(totals);

        Ok(Self {
            table: SeriesTable::new(timestamps, names, columns)?,
        })
    }

    pub fn table(&self) -> &SeriesTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn timestamps(&self) -> &[PrimitiveDateTime] {
        self.table.timestamps()
    }

    /// Building columns only, without the derived `Total`.
    pub fn building_names(&self) -> &[String] {
        let names = self.table.names();
        &names[..names.len() - 1]
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.table.column(name)
    }
}

/// The canonical series resampled to a coarser period. Derived on demand,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSeries {
    granularity: Granularity,
    table: SeriesTable,
}

impl AggregatedSeries {
    pub fn new(granularity: Granularity, table: SeriesTable) -> Self {
        Self { granularity, table }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn table(&self) -> &SeriesTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn timestamps(&self) -> &[PrimitiveDateTime] {
        self.table.timestamps()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.table.column(name)
    }
}
