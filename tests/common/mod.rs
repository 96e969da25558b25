//! Shared fixtures for integration tests
//!
//! Builds a small, well separated crop dataset and trains artifacts from it.

#![allow(dead_code)]

use crop_advisor::ml::{train, FeatureVector, ModelArtifact, TrainingConfig, TrainingRecord};
use std::path::{Path, PathBuf};

/// Crop centres in `N, P, K, temperature, humidity, ph, rainfall` order
pub const CROPS: [(&str, [f64; 7]); 5] = [
    ("rice", [90.0, 42.0, 43.0, 21.0, 82.0, 6.5, 205.0]),
    ("maize", [78.0, 48.0, 20.0, 22.0, 65.0, 6.2, 85.0]),
    ("chickpea", [40.0, 68.0, 80.0, 18.0, 17.0, 7.3, 80.0]),
    ("kidneybeans", [20.0, 67.0, 20.0, 20.0, 22.0, 5.7, 105.0]),
    ("coffee", [101.0, 28.0, 30.0, 25.5, 58.0, 6.8, 158.0]),
];

const STEPS: [f64; 7] = [2.0, 2.0, 2.0, 0.5, 1.0, 0.05, 5.0];

pub fn features_from(row: [f64; 7]) -> FeatureVector {
    FeatureVector {
        nitrogen: row[0],
        phosphorus: row[1],
        potassium: row[2],
        temperature: row[3],
        humidity: row[4],
        ph: row[5],
        rainfall: row[6],
    }
}

/// The rice row from the public crop recommendation dataset
pub fn rice_features() -> FeatureVector {
    features_from([90.0, 42.0, 43.0, 20.88, 82.0, 6.5, 202.9])
}

pub fn fixture_records(per_crop: usize) -> Vec<TrainingRecord> {
    let mut records = vec![TrainingRecord::new(rice_features(), "rice")];
    for i in 0..per_crop {
        for (label, centre) in CROPS.iter() {
            let mut row = [0.0; 7];
            for j in 0..7 {
                let offset = ((i * (j + 3) + j) % 7) as f64 - 3.0;
                row[j] = centre[j] + offset * STEPS[j];
            }
            records.push(TrainingRecord::new(features_from(row), *label));
        }
    }
    records
}

pub fn fixture_labels() -> Vec<String> {
    let mut labels: Vec<String> = CROPS.iter().map(|(label, _)| label.to_string()).collect();
    labels.sort();
    labels
}

/// Write the fixture dataset as CSV
pub fn write_dataset(dir: &Path, per_crop: usize) -> PathBuf {
    let path = dir.join("Crop_recommendation.csv");
    let mut writer = csv::Writer::from_path(&path).expect("create dataset");
    for record in fixture_records(per_crop) {
        writer.serialize(record).expect("write record");
    }
    writer.flush().expect("flush dataset");
    path
}

pub fn training_config(dir: &Path, dataset_path: PathBuf) -> TrainingConfig {
    TrainingConfig {
        dataset_path,
        artifact_path: dir.join("crop_recommender.bin"),
        test_size: 0.2,
        seed: 42,
        n_estimators: 25,
    }
}

/// Train on the fixture dataset and load the resulting artifact
pub fn trained_artifact(dir: &Path) -> ModelArtifact {
    let config = training_config(dir, write_dataset(dir, 20));
    train(&config).expect("training succeeds");
    ModelArtifact::load(&config.artifact_path).expect("artifact loads")
}
