//! HTTP handlers

pub mod api;
pub mod dashboard;
mod extract;
pub mod health;

#[cfg(test)]
mod tests;

use crate::logic::batch::{run_batch, BatchRecord, BatchTable};
use crate::{AppError, AppResult, AppState};

/// Batch inference off the async workers; row count is unbounded
pub(crate) async fn run_batch_blocking(
    state: &AppState,
    table: BatchTable,
) -> AppResult<Vec<BatchRecord>> {
    let pipeline = state.pipeline.clone();
    let rows = table.rows.len();

    let records = tokio::task::spawn_blocking(move || run_batch(&pipeline, &table))
        .await
        .map_err(|e| AppError::InternalError(format!("batch task failed: {}", e)))??;

    tracing::info!(rows, "Batch prediction completed");
    Ok(records)
}

/// Optional cosmetic "processing" pause; dropped with the request future
pub(crate) async fn processing_delay(state: &AppState) {
    let delay = state.config.processing_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
