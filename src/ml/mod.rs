/// Machine learning core for crop recommendation
///
/// This module provides:
/// - The feature/label data model and the fixed feature column order
/// - CSV dataset loading
/// - A random forest classifier over the seven soil/climate features
/// - The versioned on-disk model artifact
/// - The training pipeline (split, fit, evaluate, save)

pub mod artifact;
pub mod classifier;
pub mod dataset;
pub mod models;
pub mod trainer;

pub use artifact::{ModelArtifact, ARTIFACT_FORMAT_VERSION, ARTIFACT_MAGIC};
pub use classifier::{CropClassifier, ForestParams};
pub use dataset::{load_csv, read_records};
pub use models::{
    split_indices, ClassMetrics, FeatureVector, ModelMetadata, ModelMetrics, PredictionResult,
    TrainingDataset, TrainingRecord, FEATURE_COLUMNS, N_FEATURES,
};
pub use trainer::{train, TrainingConfig, TrainingReport};
