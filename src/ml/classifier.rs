use crate::error::{AppError, Result};
use crate::ml::models::{FeatureVector, ModelMetrics, TrainingDataset, N_FEATURES};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::SplitCriterion;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

type Forest = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_trees: u16,

    /// Seed for bootstrap sampling and per-split feature selection
    pub seed: u64,

    /// Maximum tree depth (unbounded when `None`)
    pub max_depth: Option<u16>,

    /// Minimum samples required to split a node
    pub min_samples_split: usize,

    /// Minimum samples in a leaf
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl ForestParams {
    pub fn with_n_trees(mut self, n_trees: u16) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u16) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Hyperparameters as strings, for model metadata
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("n_trees".to_string(), self.n_trees.to_string());
        map.insert("seed".to_string(), self.seed.to_string());
        map.insert(
            "max_depth".to_string(),
            self.max_depth
                .map(|d| d.to_string())
                .unwrap_or_else(|| "none".to_string()),
        );
        map.insert(
            "min_samples_split".to_string(),
            self.min_samples_split.to_string(),
        );
        map.insert(
            "min_samples_leaf".to_string(),
            self.min_samples_leaf.to_string(),
        );
        map.insert("criterion".to_string(), "gini".to_string());
        map
    }

    fn to_smartcore(&self) -> RandomForestClassifierParameters {
        let params = RandomForestClassifierParameters::default()
            .with_criterion(SplitCriterion::Gini)
            .with_n_trees(self.n_trees)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_seed(self.seed);

        match self.max_depth {
            Some(depth) => params.with_max_depth(depth),
            None => params,
        }
    }
}

/// What `CropClassifier` consults at predict time
#[derive(Serialize, Deserialize)]
enum Estimator {
    Forest(Forest),
    /// Training data held a single crop; every prediction is that crop.
    Constant,
}

/// Crop classifier: a fitted random forest plus the label table it predicts into.
///
/// Class ids inside the forest are indices into `labels`, which is sorted.
#[derive(Serialize, Deserialize)]
pub struct CropClassifier {
    labels: Vec<String>,
    params: ForestParams,
    estimator: Estimator,
}

impl CropClassifier {
    /// Fit a forest on the dataset
    pub fn fit(dataset: &TrainingDataset, params: &ForestParams) -> Result<Self> {
        if dataset.n_samples == 0 {
            return Err(AppError::Dataset(
                "cannot fit a classifier on an empty dataset".to_string(),
            ));
        }
        if dataset.features.ncols() != N_FEATURES {
            return Err(AppError::Dataset(format!(
                "expected {} feature columns, got {}",
                N_FEATURES,
                dataset.features.ncols()
            )));
        }

        let labels = dataset.label_set();
        let index: HashMap<&str, i32> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.as_str(), i as i32))
            .collect();

        let x = Self::ndarray_to_densematrix(&dataset.features);
        let y: Vec<i32> = dataset
            .labels
            .iter()
            .map(|label| index[label.as_str()])
            .collect();

        debug!(
            n_samples = dataset.n_samples,
            n_classes = labels.len(),
            n_trees = params.n_trees,
            "Fitting random forest"
        );

        // smartcore refuses to fit fewer than two classes
        let estimator = if labels.len() == 1 {
            Estimator::Constant
        } else {
            Estimator::Forest(Forest::fit(&x, &y, params.to_smartcore())?)
        };

        Ok(Self {
            labels,
            params: params.clone(),
            estimator,
        })
    }

    /// Predict the crop for a single feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<String> {
        let x = DenseMatrix::new(1, N_FEATURES, features.to_row().to_vec(), false);
        let predictions = self.predict_ids(&x, 1)?;

        let class_id = predictions
            .first()
            .copied()
            .ok_or_else(|| AppError::Model("Forest returned no prediction".to_string()))?;
        self.label_for(class_id)
    }

    /// Predict crops for every row of a feature matrix
    pub fn predict_batch(&self, features: &Array2<f64>) -> Result<Vec<String>> {
        if features.ncols() != N_FEATURES {
            return Err(AppError::Validation(format!(
                "expected {} feature columns, got {}",
                N_FEATURES,
                features.ncols()
            )));
        }
        if features.nrows() == 0 {
            return Ok(Vec::new());
        }

        let x = Self::ndarray_to_densematrix(features);
        let predictions = self.predict_ids(&x, features.nrows())?;

        predictions
            .into_iter()
            .map(|class_id| self.label_for(class_id))
            .collect()
    }

    /// Accuracy and per-class metrics on a labeled partition
    pub fn evaluate(&self, dataset: &TrainingDataset) -> Result<ModelMetrics> {
        let predictions = self.predict_batch(&dataset.features)?;
        Ok(ModelMetrics::calculate(
            &dataset.labels,
            &predictions,
            &self.labels,
        ))
    }

    /// Labels seen during training, sorted
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Hyperparameters the forest was fitted with
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Whether a forest was fitted, as opposed to a single-crop constant model
    pub fn is_forest(&self) -> bool {
        matches!(self.estimator, Estimator::Forest(_))
    }

    fn predict_ids(&self, x: &DenseMatrix<f64>, n_rows: usize) -> Result<Vec<i32>> {
        match &self.estimator {
            Estimator::Forest(forest) => Ok(forest.predict(x)?),
            Estimator::Constant => Ok(vec![0; n_rows]),
        }
    }

    fn label_for(&self, class_id: i32) -> Result<String> {
        usize::try_from(class_id)
            .ok()
            .and_then(|i| self.labels.get(i))
            .cloned()
            .ok_or_else(|| AppError::Model(format!("Unknown class id {}", class_id)))
    }

    fn ndarray_to_densematrix(arr: &Array2<f64>) -> DenseMatrix<f64> {
        let shape = arr.shape();
        let data: Vec<f64> = arr.iter().copied().collect();
        DenseMatrix::new(shape[0], shape[1], data, false)
    }
}

impl std::fmt::Debug for CropClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CropClassifier")
            .field("labels", &self.labels)
            .field("params", &self.params)
            .field("forest", &self.is_forest())
            .finish_non_exhaustive()
    }
}
