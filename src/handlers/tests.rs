//! Router tests
//!
//! Drive the full router (layers included) with in-memory requests.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use tokio_test::assert_ok;
use tower::ServiceExt;

use crate::config::Config;
use crate::logic::features::layout::{default_values, feature_names};
use crate::logic::features::{FeatureWeighting, FEATURE_COUNT};
use crate::logic::model::store::fixtures;
use crate::logic::model::Pipeline;
use crate::{create_router, AppState};

fn app() -> Router {
    app_with(Config::default())
}

fn app_with(config: Config) -> Router {
    create_router(AppState {
        pipeline: Pipeline::new(Arc::new(fixtures::store()), config.feature_weighting),
        config,
    })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = assert_ok!(app.oneshot(request).await);
    let status = response.status();
    let bytes = assert_ok!(to_bytes(response.into_body(), usize::MAX).await);
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

fn csv_body(rows: usize) -> String {
    let row = default_values()
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let mut out = feature_names().collect::<Vec<_>>().join(",");
    for _ in 0..rows {
        out.push('\n');
        out.push_str(&row);
    }
    out
}

fn multipart(csv: &str) -> (String, String) {
    let boundary = "----dashboard-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"readings.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{b}--\r\n",
        b = boundary,
    );
    (format!("multipart/form-data; boundary={}", boundary), body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["feature_weighting"], "none");
}

#[tokio::test]
async fn test_index_renders_controls_and_importance() {
    let (status, body) = send(app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches(r#"type="range""#).count(), FEATURE_COUNT);
    assert_eq!(body.matches(r#"class="bar-row""#).count(), 8);
    assert!(!body.contains("Prediction Results"));
}

#[tokio::test]
async fn test_form_predict_renders_results() {
    let request = post(
        "/predict",
        "application/x-www-form-urlencoded",
        "Pressure=85&RPM=3200&GasLeak=40",
    );
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Prediction Results"));
    assert!(body.contains("SEVERITY:"));
    assert!(body.contains(r#"name="RPM" min="1500" max="5000" step="10" value="3200""#));
}

#[tokio::test]
async fn test_form_predict_rejects_unknown_field() {
    let request = post("/predict", "application/x-www-form-urlencoded", "Humidity=3");
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(r#"class="error""#));
    assert!(body.contains("Humidity"));
}

#[tokio::test]
async fn test_api_predict_defaults() {
    let (status, body) = send(app(), post("/api/v1/predict", "application/json", "{}")).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let risk = json["prediction"]["risk_score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&risk));
    assert_eq!(json["prediction"]["severity"], "Normal");
    assert_eq!(json["prediction"]["outage_type"], "Compressor Failure");
    assert_eq!(json["inputs"]["Energy"], 4000.0);
}

#[tokio::test]
async fn test_api_predict_unknown_feature() {
    let request = post("/api/v1/predict", "application/json", r#"{"Humidity": 1.0}"#);
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Humidity"));
}

#[tokio::test]
async fn test_api_legacy_weighting_shifts_score() {
    let plain = send(app(), post("/api/v1/predict", "application/json", "{}")).await;
    let legacy_app = app_with(Config {
        feature_weighting: FeatureWeighting::Legacy,
        ..Config::default()
    });
    let legacy = send(legacy_app, post("/api/v1/predict", "application/json", "{}")).await;

    let score = |body: &str| {
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        json["prediction"]["raw_risk_score"].as_f64().unwrap()
    };
    assert!(score(&legacy.1) > score(&plain.1));
}

#[tokio::test]
async fn test_api_batch_json() {
    let request = post("/api/v1/predict/batch", "text/csv", csv_body(11));
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["row_count"], 11);
    assert_eq!(json["rows"].as_array().unwrap().len(), 11);
    assert_eq!(json["columns"].as_array().unwrap().len(), FEATURE_COUNT + 3);
    for row in json["rows"].as_array().unwrap() {
        assert!(!row["prediction"]["risk_score"].is_null());
        assert!(!row["prediction"]["severity_label"].is_null());
        assert!(!row["prediction"]["outage_type"].is_null());
    }
}

#[tokio::test]
async fn test_api_batch_csv_download() {
    let request = post("/api/v1/predict/batch.csv", "text/csv", csv_body(3));
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with("Risk_Score,Severity,Outage_Type"));
}

#[tokio::test]
async fn test_api_batch_missing_column() {
    let csv = csv_body(2).replacen("Inspection,", "", 1);
    let (status, body) = send(app(), post("/api/v1/predict/batch", "text/csv", csv)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Inspection"));
}

#[tokio::test]
async fn test_upload_batch_renders_table() {
    let (content_type, body) = multipart(&csv_body(12));
    let (status, html) = send(app(), post("/batch", &content_type, body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("12 rows processed"));
    // header row + 12 data rows
    assert_eq!(html.matches("<tr>").count(), 13);
}

#[tokio::test]
async fn test_upload_batch_missing_column_fails_visibly() {
    let csv = csv_body(2).replacen("Voltage", "Volts", 1);
    let (content_type, body) = multipart(&csv);
    let (status, html) = send(app(), post("/batch", &content_type, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains(r#"class="error""#));
    assert!(html.contains("Voltage"));
}

#[tokio::test]
async fn test_importance_endpoint() {
    let (status, body) = send(app(), get("/api/v1/importance")).await;
    assert_eq!(status, StatusCode::OK);
    let pairs: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(pairs.len(), 8);
    let values: Vec<f64> = pairs.iter().map(|p| p["importance"].as_f64().unwrap()).collect();
    assert!(values.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_features_and_template() {
    let (status, body) = send(app(), get("/api/v1/features")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["feature_count"], FEATURE_COUNT);

    let (status, body) = send(app(), get("/api/v1/template.csv")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.lines().count(), 2);
}

#[tokio::test]
async fn test_api_predict_non_numeric_reading() {
    for body in [r#"{"Pressure":"abc"}"#, r#"{"Pressure":null}"#] {
        let (status, body) = send(app(), post("/api/v1/predict", "application/json", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], 400);
        assert!(json["error"].as_str().unwrap().contains("Pressure"));
    }
}

#[tokio::test]
async fn test_api_predict_malformed_json() {
    let request = post("/api/v1/predict", "application/json", "{\"Pressure\": 8");
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["error"].is_string());
}

fn small_upload_app() -> Router {
    app_with(Config {
        max_upload_bytes: 100,
        ..Config::default()
    })
}

#[tokio::test]
async fn test_api_batch_over_upload_limit() {
    let csv = csv_body(10);
    assert!(csv.len() > 100);

    for uri in ["/api/v1/predict/batch", "/api/v1/predict/batch.csv"] {
        let (status, body) = send(small_upload_app(), post(uri, "text/csv", csv.clone())).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], 413);
        assert!(json["error"].as_str().unwrap().contains("size limit"));
    }
}

#[tokio::test]
async fn test_upload_batch_over_upload_limit() {
    let (content_type, body) = multipart(&csv_body(10));
    let (status, html) = send(small_upload_app(), post("/batch", &content_type, body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(html.contains(r#"class="error""#));
    assert!(html.contains("size limit"));
}

#[tokio::test]
async fn test_models_endpoint() {
    let (status, body) = send(app(), get("/api/v1/models")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["store"]["feature_count"], FEATURE_COUNT);
    assert_eq!(json["feature_weighting"], "none");
}
