use serde::{Deserialize, Serialize};

/// Per-point verdict from the anomaly detector, aligned 1:1 with the scored
/// series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyLabel {
    Normal,
    Anomalous,
}

impl AnomalyLabel {
    pub fn is_anomalous(self) -> bool {
        self == AnomalyLabel::Anomalous
    }
}
