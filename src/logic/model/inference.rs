//! Inference Pipeline
//!
//! scaler → risk regressor / severity classifier / outage classifier →
//! label decoders. Any failing step aborts the whole request.

use std::sync::Arc;
use std::time::Instant;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::artifacts::ModelError;
use super::store::ModelStore;
use crate::logic::features::{FeatureVector, FeatureWeighting, FEATURE_COUNT};
use crate::logic::severity::Severity;

/// Display range of the risk gauge
pub const RISK_MIN: f64 = 0.0;
pub const RISK_MAX: f64 = 100.0;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Prediction output for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Risk score clamped into the 0-100 display range
    pub risk_score: f64,
    /// Unclamped regressor output
    pub raw_risk_score: f64,
    pub severity: Severity,
    /// Label exactly as the severity decoder returned it
    pub severity_label: String,
    pub outage_type: String,
}

// ============================================================================
// PIPELINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct Pipeline {
    store: Arc<ModelStore>,
    weighting: FeatureWeighting,
}

impl Pipeline {
    pub fn new(store: Arc<ModelStore>, weighting: FeatureWeighting) -> Self {
        Self { store, weighting }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn weighting(&self) -> FeatureWeighting {
        self.weighting
    }

    /// Single-record path
    pub fn infer(&self, vector: &FeatureVector) -> Result<PredictionResult, ModelError> {
        let mut results = self.infer_rows(&[vector.values])?;
        let result = results.pop().ok_or(ModelError::ShapeMismatch {
            expected: 1,
            actual: 0,
        })?;

        tracing::debug!(
            risk = result.risk_score,
            severity = %result.severity,
            outage = %result.outage_type,
            "Single-record inference"
        );
        Ok(result)
    }

    /// Batch path over fixed-width rows
    pub fn infer_rows(
        &self,
        rows: &[[f64; FEATURE_COUNT]],
    ) -> Result<Vec<PredictionResult>, ModelError> {
        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        let matrix = Array2::from_shape_vec((rows.len(), FEATURE_COUNT), flat).map_err(|_| {
            ModelError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: rows.first().map(|r| r.len()).unwrap_or(0),
            }
        })?;
        self.infer_matrix(matrix)
    }

    /// Run the pipeline on a raw (unscaled) matrix, one record per row
    pub fn infer_matrix(&self, mut x: Array2<f64>) -> Result<Vec<PredictionResult>, ModelError> {
        if x.ncols() != FEATURE_COUNT {
            return Err(ModelError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: x.ncols(),
            });
        }
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }
        let start = Instant::now();

        for &(index, factor) in self.weighting.factors() {
            x.column_mut(index).mapv_inplace(|v| v * factor);
        }

        let scaled = self.store.scaler().transform(x.view())?;

        let risk = self.store.risk().predict(scaled.view())?;
        let severity_codes = self.store.severity().predict(scaled.view())?;
        let outage_codes = self.store.outage().predict(scaled.view())?;

        let severity_decoder = self.store.severity_decoder();
        let outage_decoder = self.store.outage_decoder();

        let mut results = Vec::with_capacity(x.nrows());
        for ((raw, sev_code), out_code) in risk.iter().zip(severity_codes).zip(outage_codes) {
            let severity_label = severity_decoder
                .inverse_transform(sev_code)
                .ok_or(ModelError::UnknownCode {
                    decoder: "severity_encoder",
                    code: sev_code,
                })?;
            let outage_type = outage_decoder
                .inverse_transform(out_code)
                .ok_or(ModelError::UnknownCode {
                    decoder: "outage_encoder",
                    code: out_code,
                })?;

            results.push(PredictionResult {
                risk_score: clamp_risk(*raw),
                raw_risk_score: *raw,
                severity: Severity::from_label(severity_label),
                severity_label: severity_label.to_string(),
                outage_type: outage_type.to_string(),
            });
        }

        tracing::debug!(
            rows = results.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Inference complete"
        );
        Ok(results)
    }
}

fn clamp_risk(raw: f64) -> f64 {
    if raw.is_nan() {
        RISK_MIN
    } else {
        raw.clamp(RISK_MIN, RISK_MAX)
    }
}

// ============================================================================
// TESTS
// ============================================================================
