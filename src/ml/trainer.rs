use crate::config::TrainingSettings;
use crate::error::{AppError, Result};
use crate::ml::artifact::ModelArtifact;
use crate::ml::classifier::{CropClassifier, ForestParams};
use crate::ml::dataset::load_csv;
use crate::ml::models::{split_indices, ModelMetadata, ModelMetrics, TrainingDataset, N_FEATURES};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Inputs of one training run
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub dataset_path: PathBuf,
    pub artifact_path: PathBuf,
    pub test_size: f64,
    pub seed: u64,
    pub n_estimators: u16,
}

impl TrainingConfig {
    pub fn new(settings: &TrainingSettings, artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: settings.dataset_path.clone(),
            artifact_path: artifact_path.into(),
            test_size: settings.test_size,
            seed: settings.seed,
            n_estimators: settings.n_estimators,
        }
    }

    fn forest_params(&self) -> ForestParams {
        ForestParams::default()
            .with_n_trees(self.n_estimators)
            .with_seed(self.seed)
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new(&TrainingSettings::default(), "crop_recommender.bin")
    }
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    /// Holdout accuracy
    pub accuracy: f64,
    pub metrics: ModelMetrics,
    pub n_train: usize,
    pub n_test: usize,
    /// Dataset rows (0-based, file order) held out for evaluation
    pub test_indices: Vec<usize>,
    pub labels: Vec<String>,
    pub artifact_path: PathBuf,
    pub elapsed_ms: u128,
}

/// Load the dataset, split, fit, evaluate on the holdout partition and write the artifact.
///
/// Nothing is written unless every earlier step succeeded.
pub fn train(config: &TrainingConfig) -> Result<TrainingReport> {
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(AppError::Configuration(format!(
            "test_size must be in (0, 1), got {}",
            config.test_size
        )));
    }
    if config.n_estimators == 0 {
        return Err(AppError::Configuration(
            "n_estimators must be at least 1".to_string(),
        ));
    }

    let started = Instant::now();
    let records = load_csv(&config.dataset_path)?;
    let dataset = TrainingDataset::from_records(&records);

    let (train_idx, test_idx) = split_indices(dataset.n_samples, config.test_size, config.seed);
    let train_set = dataset.select(&train_idx);
    let test_set = dataset.select(&test_idx);
    if train_set.n_samples == 0 || test_set.n_samples == 0 {
        return Err(AppError::Dataset(format!(
            "{} records are too few for a {:.0}% holdout split",
            dataset.n_samples,
            config.test_size * 100.0
        )));
    }

    info!(
        n_train = train_set.n_samples,
        n_test = test_set.n_samples,
        seed = config.seed,
        "Split dataset"
    );

    let params = config.forest_params();
    let classifier = CropClassifier::fit(&train_set, &params)?;
    info!(
        n_trees = params.n_trees,
        n_classes = classifier.labels().len(),
        "Random forest fitted"
    );

    let metrics = classifier.evaluate(&test_set)?;
    info!(accuracy = metrics.accuracy, "Holdout evaluation complete");

    let labels = classifier.labels().to_vec();
    let metadata = ModelMetadata {
        name: "Random Forest".to_string(),
        trained_with: env!("CARGO_PKG_VERSION").to_string(),
        trained_at: chrono::Utc::now(),
        n_training_samples: train_set.n_samples,
        n_features: N_FEATURES,
        hyperparameters: classifier.params().to_map(),
        validation_metrics: Some(metrics.clone()),
    };

    ModelArtifact::new(classifier, metadata).save(&config.artifact_path)?;

    Ok(TrainingReport {
        accuracy: metrics.accuracy,
        metrics,
        n_train: train_set.n_samples,
        n_test: test_set.n_samples,
        test_indices: test_idx,
        labels,
        artifact_path: config.artifact_path.clone(),
        elapsed_ms: started.elapsed().as_millis(),
    })
}
