//! JSON / CSV API handlers

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::extract::{ApiJson, CsvBody};
use super::{processing_delay, run_batch_blocking};
use crate::logic::batch::{parse_csv, template_csv, to_csv, to_response, BatchResponse};
use crate::logic::features::{FeatureVector, FeatureWeighting, LayoutInfo};
use crate::logic::importance::{FeatureImportance, TOP_FEATURES};
use crate::logic::model::{ModelStoreInfo, PredictionResult};
use crate::{AppResult, AppState};

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub inputs: BTreeMap<&'static str, f64>,
    pub prediction: PredictionResult,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub store: ModelStoreInfo,
    pub feature_weighting: FeatureWeighting,
}

/// Feature layout with ranges and defaults
pub async fn features() -> Json<LayoutInfo> {
    Json(LayoutInfo::current())
}

/// Loaded artifacts and checksums
pub async fn models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        store: state.pipeline.store().info(),
        feature_weighting: state.pipeline.weighting(),
    })
}

/// Top feature importances of the risk model
pub async fn importance(State(state): State<AppState>) -> Json<Vec<FeatureImportance>> {
    Json(state.pipeline.store().top_features(TOP_FEATURES))
}

/// Single-record prediction from a name → reading map
pub async fn predict(
    State(state): State<AppState>,
    ApiJson(readings): ApiJson<BTreeMap<String, f64>>,
) -> AppResult<Json<PredictResponse>> {
    let inputs = FeatureVector::from_readings(readings.iter().map(|(k, v)| (k.as_str(), *v)))?;
    let prediction = state.pipeline.infer(&inputs)?;
    processing_delay(&state).await;

    Ok(Json(PredictResponse {
        prediction_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        inputs: inputs.named_values().into_iter().collect(),
        prediction,
    }))
}

/// CSV body → JSON rows
pub async fn predict_batch(
    State(state): State<AppState>,
    CsvBody(body): CsvBody,
) -> AppResult<Json<BatchResponse>> {
    let table = parse_csv(&body)?;
    let records = run_batch_blocking(&state, table).await?;
    Ok(Json(to_response(records)))
}

/// CSV body → augmented CSV
pub async fn predict_batch_csv(
    State(state): State<AppState>,
    CsvBody(body): CsvBody,
) -> AppResult<Response> {
    let table = parse_csv(&body)?;
    let records = run_batch_blocking(&state, table).await?;
    let csv = to_csv(&records)?;

    Ok(([(header::CONTENT_TYPE, CSV_CONTENT_TYPE)], csv).into_response())
}

/// Upload template: header plus one row of defaults
pub async fn template() -> AppResult<Response> {
    let csv = template_csv()?;
    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"readings_template.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}
