use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Column order of the feature matrix, shared by training and inference.
pub const FEATURE_COLUMNS: [&str; 7] = ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// Number of input features
pub const N_FEATURES: usize = FEATURE_COLUMNS.len();

/// Soil and climate measurements for one field.
///
/// Deserializes from the wire format `{"N": .., "P": .., "K": .., "temperature": ..,
/// "humidity": .., "ph": .., "rainfall": ..}`. Every key is required; integers and
/// floats are both accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Nitrogen content
    #[serde(rename = "N")]
    pub nitrogen: f64,

    /// Phosphorus content
    #[serde(rename = "P")]
    pub phosphorus: f64,

    /// Potassium content
    #[serde(rename = "K")]
    pub potassium: f64,

    /// Temperature in degrees Celsius
    pub temperature: f64,

    /// Relative humidity in percent
    pub humidity: f64,

    /// Soil pH
    pub ph: f64,

    /// Rainfall in mm
    pub rainfall: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_COLUMNS` order
    pub fn to_row(&self) -> [f64; N_FEATURES] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }
}

/// One labeled row of the training dataset.
///
/// Fields are flat so CSV rows deserialize by header name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,

    /// Crop name
    pub label: String,
}

impl TrainingRecord {
    pub fn new(features: FeatureVector, label: impl Into<String>) -> Self {
        Self {
            nitrogen: features.nitrogen,
            phosphorus: features.phosphorus,
            potassium: features.potassium,
            temperature: features.temperature,
            humidity: features.humidity,
            ph: features.ph,
            rainfall: features.rainfall,
            label: label.into(),
        }
    }

    /// The unlabeled measurements of this record
    pub fn features(&self) -> FeatureVector {
        FeatureVector {
            nitrogen: self.nitrogen,
            phosphorus: self.phosphorus,
            potassium: self.potassium,
            temperature: self.temperature,
            humidity: self.humidity,
            ph: self.ph,
            rainfall: self.rainfall,
        }
    }
}

/// Training dataset
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Feature matrix (n_samples × N_FEATURES), columns in `FEATURE_COLUMNS` order
    pub features: Array2<f64>,

    /// Crop label per row
    pub labels: Vec<String>,

    /// Number of samples
    pub n_samples: usize,
}

impl TrainingDataset {
    /// Create a new training dataset from records
    pub fn from_records(records: &[TrainingRecord]) -> Self {
        let n_samples = records.len();
        let mut features = Array2::zeros((n_samples, N_FEATURES));
        let mut labels = Vec::with_capacity(n_samples);

        for (i, record) in records.iter().enumerate() {
            for (j, value) in record.features().to_row().into_iter().enumerate() {
                features[[i, j]] = value;
            }
            labels.push(record.label.clone());
        }

        Self {
            features,
            labels,
            n_samples,
        }
    }

    /// Sorted, de-duplicated labels
    pub fn label_set(&self) -> Vec<String> {
        self.labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows at the given indices, in that order
    pub fn select(&self, indices: &[usize]) -> TrainingDataset {
        TrainingDataset {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
            n_samples: indices.len(),
        }
    }

    /// Shuffle and split into train/test sets
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> (TrainingDataset, TrainingDataset) {
        let (train_idx, test_idx) = split_indices(self.n_samples, test_size, seed);
        (self.select(&train_idx), self.select(&test_idx))
    }
}

/// Seeded shuffle of `0..n_samples` into (train, test) index lists.
///
/// The test partition holds `ceil(n_samples * test_size)` rows, capped at `n_samples`.
pub fn split_indices(n_samples: usize, test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n_test = ((n_samples as f64 * test_size).ceil() as usize).min(n_samples);

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    (train, indices)
}

/// Model evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Accuracy
    pub accuracy: f64,

    /// Macro precision
    pub precision: f64,

    /// Macro recall
    pub recall: f64,

    /// Macro F1 score
    pub f1_score: f64,

    /// Number of evaluated samples
    pub n_samples: usize,

    /// Per-class metrics keyed by label
    pub per_class_metrics: BTreeMap<String, ClassMetrics>,
}

/// Per-class evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            n_samples: 0,
            per_class_metrics: BTreeMap::new(),
        }
    }

    /// Compare predicted labels against true labels over the given label set
    pub fn calculate(y_true: &[String], y_pred: &[String], labels: &[String]) -> Self {
        let n_samples = y_true.len();
        if n_samples == 0 {
            return Self::new();
        }

        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| t == p)
            .count();
        let accuracy = correct as f64 / n_samples as f64;

        let mut per_class = BTreeMap::new();

        for label in labels {
            let tp = y_true
                .iter()
                .zip(y_pred.iter())
                .filter(|(t, p)| *t == label && *p == label)
                .count();
            let fp = y_true
                .iter()
                .zip(y_pred.iter())
                .filter(|(t, p)| *t != label && *p == label)
                .count();
            let fn_count = y_true
                .iter()
                .zip(y_pred.iter())
                .filter(|(t, p)| *t == label && *p != label)
                .count();

            let precision = if tp + fp > 0 {
                tp as f64 / (tp + fp) as f64
            } else {
                0.0
            };
            let recall = if tp + fn_count > 0 {
                tp as f64 / (tp + fn_count) as f64
            } else {
                0.0
            };
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            per_class.insert(
                label.clone(),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score: f1,
                    support: tp + fn_count,
                },
            );
        }

        let n_classes = per_class.len().max(1) as f64;
        let precision = per_class.values().map(|m| m.precision).sum::<f64>() / n_classes;
        let recall = per_class.values().map(|m| m.recall).sum::<f64>() / n_classes;
        let f1_score = per_class.values().map(|m| m.f1_score).sum::<f64>() / n_classes;

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            n_samples,
            per_class_metrics: per_class,
        }
    }
}

impl Default for ModelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Model metadata stored alongside the fitted forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Version of the crate that trained the model
    pub trained_with: String,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,

    /// Metrics on the holdout partition
    pub validation_metrics: Option<ModelMetrics>,
}

/// Response of a single prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub recommended_crop: String,
}
