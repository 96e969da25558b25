//! On-disk model artifact.
//!
//! Layout: the 8-byte magic `CROPRF01` followed by a bincode payload of
//! [`ModelArtifact`]. The payload records its own format version and the
//! feature column order the forest was trained with; both are checked on load.

use crate::error::{AppError, Result};
use crate::ml::classifier::CropClassifier;
use crate::ml::models::{FeatureVector, ModelMetadata, FEATURE_COLUMNS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File header identifying a crop model artifact
pub const ARTIFACT_MAGIC: &[u8; 8] = b"CROPRF01";

/// Payload layout version written by this build
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Fitted model plus everything needed to serve it
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_columns: Vec<String>,
    pub metadata: ModelMetadata,
    pub classifier: CropClassifier,
}

impl ModelArtifact {
    pub fn new(classifier: CropClassifier, metadata: ModelMetadata) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            metadata,
            classifier,
        }
    }

    /// Crop labels the model can predict
    pub fn labels(&self) -> &[String] {
        self.classifier.labels()
    }

    /// Predict the crop for one feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<String> {
        self.classifier.predict(features)
    }

    /// Encode as header + bincode payload
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = ARTIFACT_MAGIC.to_vec();
        bytes.extend(bincode::serialize(self)?);
        Ok(bytes)
    }

    /// Decode and validate an encoded artifact
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let payload = bytes
            .strip_prefix(ARTIFACT_MAGIC.as_slice())
            .ok_or_else(|| AppError::Artifact("not a crop model artifact".to_string()))?;

        let artifact: ModelArtifact = bincode::deserialize(payload)
            .map_err(|e| AppError::Artifact(format!("corrupt artifact payload: {}", e)))?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(AppError::Artifact(format!(
                "unsupported artifact format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if self.feature_columns.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            return Err(AppError::Artifact(format!(
                "feature columns {:?} do not match {:?}",
                self.feature_columns, FEATURE_COLUMNS
            )));
        }
        if self.labels().is_empty() {
            return Err(AppError::Artifact("artifact has no labels".to_string()));
        }
        Ok(())
    }

    /// Write the artifact, replacing any existing file.
    ///
    /// Bytes go to a sibling temporary file first and are renamed into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let tmp = temp_path(path);

        // a half-written or unrenamed temporary file never outlives a failed save
        if let Err(e) = fs::write(&tmp, &bytes).and_then(|()| fs::rename(&tmp, path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!(
            path = %path.display(),
            bytes = bytes.len(),
            "Model artifact written"
        );
        Ok(())
    }

    /// Read and validate an artifact file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            AppError::Artifact(format!("cannot read {}: {}", path.display(), e))
        })?;

        let artifact = Self::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            n_labels = artifact.labels().len(),
            trained_at = %artifact.metadata.trained_at,
            "Model artifact loaded"
        );
        Ok(artifact)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
