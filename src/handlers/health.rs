//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    models_loaded: usize,
    feature_weighting: &'static str,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        models_loaded: state.pipeline.store().info().artifacts.len(),
        feature_weighting: state.pipeline.weighting().as_str(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
