//! Error handling

use axum::{
    extract::{
        multipart::MultipartError,
        rejection::{BytesRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::logic::batch::BatchError;
use crate::logic::features::InputError;
use crate::logic::model::ModelError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(String),
    PayloadTooLarge,

    // Model store errors
    InferenceError(String),

    // Generic errors
    InternalError(String),
}

impl AppError {
    /// Status code and the message safe to show the user
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Upload exceeds the configured size limit".to_string(),
            ),
            AppError::InferenceError(msg) => {
                tracing::error!("Inference error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Prediction failed, see server logs".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// Body extraction failures: over the size limit → 413, anything else → 400
fn rejection(status: StatusCode, text: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::ValidationError(text)
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        rejection(err.status(), err.body_text())
    }
}

impl From<BytesRejection> for AppError {
    fn from(err: BytesRejection) -> Self {
        rejection(err.status(), err.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        rejection(err.status(), err.body_text())
    }
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            // Width mismatch comes from the request shape, not the server
            ModelError::ShapeMismatch { .. } => AppError::ValidationError(err.to_string()),
            other => AppError::InferenceError(other.to_string()),
        }
    }
}
