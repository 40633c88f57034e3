//! Isolation-forest anomaly scoring for one building's series.
//!
//! The detector standardizes the series so buildings with very different
//! baseline consumption are scored on the same footing, grows a forest of
//! random partitioning trees over the standardized values (Liu, Ting, Zhou,
//! "Isolation Forest", ICDM 2008), and labels the `contamination` fraction
//! with the highest scores anomalous. All randomness flows from an explicit
//! seed, so identical inputs always produce identical labels.

use meter_domain::AnomalyLabel;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::AnomalyConfig;

/// Expected fraction of anomalous points.
pub const DEFAULT_CONTAMINATION: f64 = 0.02;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TREES: usize = 100;
pub const DEFAULT_SUBSAMPLE: usize = 256;
/// Below this many points detection is skipped and everything is normal.
pub const DEFAULT_MIN_SAMPLES: usize = 10;

/// Euler-Mascheroni constant, used by the path-length normalizer.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    contamination: f64,
    seed: u64,
    trees: usize,
    subsample: usize,
    min_samples: usize,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            seed: DEFAULT_SEED,
            trees: DEFAULT_TREES,
            subsample: DEFAULT_SUBSAMPLE,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

impl AnomalyDetector {
    pub fn new(contamination: f64, seed: u64) -> Self {
        Self {
            contamination,
            seed,
            ..Self::default()
        }
    }

    pub fn from_config(cfg: &AnomalyConfig) -> Self {
        Self {
            contamination: cfg.contamination,
            seed: cfg.seed,
            trees: cfg.trees,
            subsample: cfg.subsample,
            min_samples: cfg.min_samples,
        }
    }

    /// Labels each point of `values`, 1:1 with the input.
    ///
    /// Degenerate inputs degrade to all-normal instead of erroring: series
    /// shorter than the minimum sample count are skipped outright, and a
    /// near-constant series (standardization would divide by ~zero) is
    /// treated as having no anomalies.
    pub fn label(&self, values: &[f64]) -> Vec<AnomalyLabel> {
        let n = values.len();
        if n < self.min_samples {
            return vec![AnomalyLabel::Normal; n];
        }

        let scaled = match standardize(values) {
            Some(scaled) => scaled,
            None => {
                metrics::counter!("anomaly_detection_degraded_total").increment(1);
                tracing::debug!(points = n, "near-constant series, skipping anomaly detection");
                return vec![AnomalyLabel::Normal; n];
            }
        };

        let scores = self.score(&scaled);

        let flagged = (self.contamination * n as f64).round() as usize;
        let mut order: Vec<usize> = (0..n).collect();
        // Highest score first; ties broken by index so labels are stable.
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        let mut labels = vec![AnomalyLabel::Normal; n];
        for &idx in order.iter().take(flagged) {
            labels[idx] = AnomalyLabel::Anomalous;
        }
        labels
    }

    /// Anomaly score per point: `2^(-E[path] / c(psi))`, higher is more
    /// isolated.
    fn score(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let psi = self.subsample.min(n);
        let max_depth = (psi as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut path_sums = vec![0.0; n];
        for _ in 0..self.trees {
            let sample: Vec<f64> = rand::seq::index::sample(&mut rng, n, psi)
                .iter()
                .map(|i| values[i])
                .collect();
            let tree = build_tree(&sample, 0, max_depth, &mut rng);
            for (sum, &v) in path_sums.iter_mut().zip(values) {
                *sum += path_length(&tree, v, 0.0);
            }
        }

        let norm = average_path_length(psi as f64);
        path_sums
            .iter()
            .map(|sum| {
                let avg = sum / self.trees as f64;
                2.0_f64.powf(-avg / norm)
            })
            .collect()
    }
}

enum Node {
    Leaf { size: usize },
    Split { at: f64, left: Box<Node>, right: Box<Node> },
}

fn build_tree(values: &[f64], depth: usize, max_depth: usize, rng: &mut StdRng) -> Node {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.len() <= 1 || depth >= max_depth || max - min < f64::EPSILON {
        return Node::Leaf { size: values.len() };
    }

    let at = rng.gen_range(min..max);
    let (left, right): (Vec<f64>, Vec<f64>) = values.iter().copied().partition(|&v| v < at);
    Node::Split {
        at,
        left: Box::new(build_tree(&left, depth + 1, max_depth, rng)),
        right: Box::new(build_tree(&right, depth + 1, max_depth, rng)),
    }
}

fn path_length(node: &Node, value: f64, depth: f64) -> f64 {
    match node {
        Node::Leaf { size } => depth + average_path_length(*size as f64),
        Node::Split { at, left, right } => {
            if value < *at {
                path_length(left, value, depth + 1.0)
            } else {
                path_length(right, value, depth + 1.0)
            }
        }
    }
}

/// c(n): expected path length of an unsuccessful BST search over n points,
/// the standard normalizer from the isolation-forest paper.
fn average_path_length(n: f64) -> f64 {
    if n <= 1.0 {
        0.0
    } else {
        2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
    }
}

/// Zero-mean unit-variance rescaling; `None` when the standard deviation is
/// effectively zero and the division would blow up.
fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if !std.is_finite() || std < 1e-12 {
        return None;
    }
    Some(values.iter().map(|v| (v - mean) / std).collect())
}
