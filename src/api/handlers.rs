use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::ml::{FeatureVector, ModelMetrics, PredictionResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::Uri,
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Recommend a crop for one set of soil/climate measurements
pub async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FeatureVector>, JsonRejection>,
) -> Result<Json<PredictionResult>> {
    let Json(features) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let recommended_crop = state.model.predict(&features)?;
    tracing::debug!(crop = %recommended_crop, "Prediction served");

    Ok(Json(PredictionResult { recommended_crop }))
}

/// Describe the loaded model
pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    let model = &state.model;
    Json(ModelInfoResponse {
        name: model.metadata.name.clone(),
        format_version: model.format_version,
        feature_columns: model.feature_columns.clone(),
        labels: model.labels().to_vec(),
        trained_at: model.metadata.trained_at,
        trained_with: model.metadata.trained_with.clone(),
        n_training_samples: model.metadata.n_training_samples,
        hyperparameters: model.metadata.hyperparameters.clone(),
        validation_metrics: model.metadata.validation_metrics.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub name: String,
    pub format_version: u32,
    pub feature_columns: Vec<String>,
    pub labels: Vec<String>,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub trained_with: String,
    pub n_training_samples: usize,
    pub hyperparameters: BTreeMap<String, String>,
    pub validation_metrics: Option<ModelMetrics>,
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
