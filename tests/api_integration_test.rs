/// Integration tests for the prediction HTTP API
///
/// These tests drive the axum router in-process with `oneshot`:
/// - Valid predictions and their label set
/// - Structured 400 responses for every missing field
/// - Concurrent requests returning their own results
/// - Health, model info, CORS and unknown routes

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::*;
use crop_advisor::api::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const FIELDS: [&str; 7] = ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

fn app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let artifact = trained_artifact(dir.path());
    (build_router(AppState::new(Arc::new(artifact))), dir)
}

fn rice_payload() -> Value {
    json!({
        "N": 90,
        "P": 42,
        "K": 43,
        "temperature": 20.88,
        "humidity": 82.0,
        "ph": 6.5,
        "rainfall": 202.9
    })
}

fn predict_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_predict_returns_known_label() {
    let (app, _dir) = app();

    let (status, body) = send(app, predict_request(&rice_payload())).await;

    assert_eq!(status, StatusCode::OK);
    let crop = body["recommended_crop"].as_str().unwrap();
    assert!(fixture_labels().iter().any(|l| l == crop));
    assert_eq!(crop, "rice");
}

#[tokio::test]
async fn test_predict_is_deterministic() {
    let (app, _dir) = app();

    let (_, first) = send(app.clone(), predict_request(&rice_payload())).await;
    for _ in 0..5 {
        let (status, again) = send(app.clone(), predict_request(&rice_payload())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(again, first);
    }
}

#[tokio::test]
async fn test_each_missing_field_is_a_client_error() {
    let (app, _dir) = app();

    for field in FIELDS {
        let mut payload = rice_payload();
        payload.as_object_mut().unwrap().remove(field);

        let (status, body) = send(app.clone(), predict_request(&payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "field {}", field);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("missing field"), "{}", message);
        assert!(message.contains(&format!("`{}`", field)), "{}", message);
    }
}

#[tokio::test]
async fn test_non_numeric_value_is_a_client_error() {
    let (app, _dir) = app();
    let mut payload = rice_payload();
    payload["humidity"] = json!("very");

    let (status, body) = send(app, predict_request(&payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], 400);
}

#[tokio::test]
async fn test_malformed_json_is_a_client_error() {
    let (app, _dir) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"N\": 90,"))
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_missing_content_type_is_a_client_error() {
    let (app, _dir) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .body(Body::from(rice_payload().to_string()))
        .unwrap();

    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_service_keeps_serving_after_bad_request() {
    let (app, _dir) = app();

    let (status, _) = send(app.clone(), predict_request(&json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app, predict_request(&rice_payload())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["recommended_crop"].is_string());
}

#[tokio::test]
async fn test_concurrent_requests_are_correlated() {
    let (app, _dir) = app();

    let requests = (0..40).map(|i| {
        let (label, centre) = CROPS[i % CROPS.len()];
        let mut row = centre;
        row[6] += (i / CROPS.len()) as f64 * 0.1;
        let app = app.clone();
        async move {
            let payload = serde_json::to_value(features_from(row)).unwrap();
            let (status, body) = send(app, predict_request(&payload)).await;
            (label, status, body)
        }
    });

    let handles: Vec<_> = requests.map(tokio::spawn).collect();
    let results = futures::future::join_all(handles).await;

    assert_eq!(results.len(), 40);
    for result in results {
        let (label, status, body) = result.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recommended_crop"], label);
    }
}

#[tokio::test]
async fn test_health_check() {
    let (app, _dir) = app();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_model_info() {
    let (app, _dir) = app();
    let request = Request::builder().uri("/model").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feature_columns"], json!(FIELDS));
    assert_eq!(body["labels"], json!(fixture_labels()));
    assert_eq!(body["hyperparameters"]["n_trees"], "25");
    assert!(body["validation_metrics"]["accuracy"].as_f64().unwrap() > 0.9);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (app, _dir) = app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/predict")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _dir) = app();
    let request = Request::builder()
        .uri("/recommend")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
