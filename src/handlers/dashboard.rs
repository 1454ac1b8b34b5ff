//! Dashboard handlers (server-rendered HTML)

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};

use super::{processing_delay, run_batch_blocking};
use crate::logic::batch::{parse_csv, BatchRecord};
use crate::logic::features::FeatureVector;
use crate::logic::importance::TOP_FEATURES;
use crate::logic::model::PredictionResult;
use crate::views::{render_dashboard, DashboardView};
use crate::{AppError, AppResult, AppState};

/// Multipart field carrying the CSV
const UPLOAD_FIELD: &str = "file";

fn render(
    state: &AppState,
    inputs: &FeatureVector,
    single: Option<&PredictionResult>,
    batch: Option<&[BatchRecord]>,
    error: Option<AppError>,
) -> Response {
    let importance = state.pipeline.store().top_features(TOP_FEATURES);
    let (status, message) = match &error {
        Some(err) => {
            let (status, message) = err.status_and_message();
            (status, Some(message))
        }
        None => (StatusCode::OK, None),
    };

    let page = render_dashboard(&DashboardView {
        inputs,
        single,
        batch,
        importance: &importance,
        error: message.as_deref(),
        weighting: state.pipeline.weighting(),
    });

    (status, Html(page)).into_response()
}

/// Dashboard with default readings
pub async fn index(State(state): State<AppState>) -> Response {
    render(&state, &FeatureVector::defaults(), None, None, None)
}

/// Input panel submit
pub async fn predict(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let inputs = match FeatureVector::from_text_fields(
        fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    ) {
        Ok(inputs) => inputs,
        Err(e) => {
            return render(&state, &FeatureVector::defaults(), None, None, Some(e.into()))
        }
    };

    match state.pipeline.infer(&inputs) {
        Ok(result) => {
            processing_delay(&state).await;
            render(&state, &inputs, Some(&result), None, None)
        }
        Err(e) => render(&state, &inputs, None, None, Some(e.into())),
    }
}

async fn read_upload(mut multipart: Multipart) -> AppResult<Vec<u8>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field.bytes().await?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::ValidationError(format!(
        "missing '{}' field in upload",
        UPLOAD_FIELD
    )))
}

async fn batch_records(state: &AppState, multipart: Multipart) -> AppResult<Vec<BatchRecord>> {
    let data = read_upload(multipart).await?;
    let table = parse_csv(&data)?;
    run_batch_blocking(state, table).await
}

/// CSV upload submit
pub async fn batch(State(state): State<AppState>, multipart: Multipart) -> Response {
    let defaults = FeatureVector::defaults();

    match batch_records(&state, multipart).await {
        Ok(records) => {
            processing_delay(&state).await;
            render(&state, &defaults, None, Some(&records), None)
        }
        Err(e) => {
            tracing::warn!("Batch upload rejected: {:?}", e);
            render(&state, &defaults, None, None, Some(e))
        }
    }
}
