//! Model Store - the six pre-trained artifacts
//!
//! Loaded once before the server binds, then shared read-only behind an
//! `Arc`. There is no write path.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::artifacts::{
    invalid, validate_classifier, validate_regressor, validate_scaler, Classifier, LabelEncoder,
    ModelError, Regressor, Scaler,
};
use crate::constants::{
    OUTAGE_ENCODER_FILE, OUTAGE_MODEL_FILE, RISK_MODEL_FILE, SCALER_FILE,
    SEVERITY_ENCODER_FILE, SEVERITY_MODEL_FILE,
};
use crate::logic::features::FEATURE_COUNT;
use crate::logic::importance::{top_features, FeatureImportance};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Loaded artifact summary for the API and startup logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub name: String,
    pub file: String,
    pub kind: String,
    pub sha256: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStoreInfo {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub feature_count: usize,
    pub artifacts: Vec<ArtifactInfo>,
}

/// The six artifacts before validation
#[derive(Debug, Clone)]
pub struct ModelParts {
    pub risk: Regressor,
    pub severity: Classifier,
    pub outage: Classifier,
    pub scaler: Scaler,
    pub severity_decoder: LabelEncoder,
    pub outage_decoder: LabelEncoder,
}

#[derive(Debug)]
pub struct ModelStore {
    parts: ModelParts,
    artifacts: Vec<ArtifactInfo>,
    source: String,
    loaded_at: DateTime<Utc>,
}

// ============================================================================
// LOADING
// ============================================================================

fn load_artifact<T: DeserializeOwned>(
    dir: &Path,
    name: &str,
    file: &str,
    kind: impl Fn(&T) -> &'static str,
) -> Result<(T, ArtifactInfo), ModelError> {
    let path = dir.join(file);
    let display = path.display().to_string();

    let bytes = std::fs::read(&path).map_err(|source| ModelError::Io {
        path: display.clone(),
        source,
    })?;

    let artifact: T = serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
        path: display,
        source,
    })?;

    let info = ArtifactInfo {
        name: name.to_string(),
        file: file.to_string(),
        kind: kind(&artifact).to_string(),
        sha256: hex::encode(Sha256::digest(&bytes)),
        bytes: bytes.len(),
    };

    tracing::info!(artifact = name, kind = %info.kind, sha256 = %info.sha256, "Loaded model artifact");

    Ok((artifact, info))
}

impl ModelStore {
    /// Load and validate all six artifacts from `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ModelError> {
        let dir = dir.as_ref();
        tracing::info!("Loading model store from: {}", dir.display());

        let (risk, risk_info) =
            load_artifact(dir, "risk_model", RISK_MODEL_FILE, Regressor::kind)?;
        let (severity, severity_info) =
            load_artifact(dir, "severity_model", SEVERITY_MODEL_FILE, Classifier::kind)?;
        let (outage, outage_info) =
            load_artifact(dir, "outage_model", OUTAGE_MODEL_FILE, Classifier::kind)?;
        let (scaler, scaler_info) = load_artifact(dir, "scaler", SCALER_FILE, Scaler::kind)?;
        let (severity_decoder, sev_enc_info) =
            load_artifact(dir, "severity_encoder", SEVERITY_ENCODER_FILE, |_: &LabelEncoder| {
                "label_encoder"
            })?;
        let (outage_decoder, out_enc_info) =
            load_artifact(dir, "outage_encoder", OUTAGE_ENCODER_FILE, |_: &LabelEncoder| {
                "label_encoder"
            })?;

        let parts = ModelParts {
            risk,
            severity,
            outage,
            scaler,
            severity_decoder,
            outage_decoder,
        };

        let mut store = Self::from_parts(parts)?;
        store.artifacts = vec![
            risk_info,
            severity_info,
            outage_info,
            scaler_info,
            sev_enc_info,
            out_enc_info,
        ];
        store.source = dir.display().to_string();

        tracing::info!("Model store ready ({} artifacts)", store.artifacts.len());
        Ok(store)
    }

    /// Build a store from in-memory artifacts (tests, embedding)
    pub fn from_parts(parts: ModelParts) -> Result<Self, ModelError> {
        validate(&parts)?;
        Ok(Self {
            parts,
            artifacts: Vec::new(),
            source: "<memory>".to_string(),
            loaded_at: Utc::now(),
        })
    }

    pub fn risk(&self) -> &Regressor {
        &self.parts.risk
    }

    pub fn severity(&self) -> &Classifier {
        &self.parts.severity
    }

    pub fn outage(&self) -> &Classifier {
        &self.parts.outage
    }

    pub fn scaler(&self) -> &Scaler {
        &self.parts.scaler
    }

    pub fn severity_decoder(&self) -> &LabelEncoder {
        &self.parts.severity_decoder
    }

    pub fn outage_decoder(&self) -> &LabelEncoder {
        &self.parts.outage_decoder
    }

    /// Top `n` features by the risk model's importance
    pub fn top_features(&self, n: usize) -> Vec<FeatureImportance> {
        top_features(&self.parts.risk.feature_importances(), n)
    }

    pub fn info(&self) -> ModelStoreInfo {
        ModelStoreInfo {
            source: self.source.clone(),
            loaded_at: self.loaded_at,
            feature_count: FEATURE_COUNT,
            artifacts: self.artifacts.clone(),
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

fn check_feature_width(name: &'static str, width: usize) -> Result<(), ModelError> {
    if width != FEATURE_COUNT {
        return Err(invalid(
            name,
            format!("fitted on {} features, layout has {}", width, FEATURE_COUNT),
        ));
    }
    Ok(())
}

fn validate(parts: &ModelParts) -> Result<(), ModelError> {
    validate_scaler(&parts.scaler)?;
    check_feature_width("scaler", parts.scaler.n_features())?;

    validate_regressor("risk_model", &parts.risk)?;
    check_feature_width("risk_model", parts.risk.n_features())?;
    if parts.risk.feature_importances().iter().any(|v| !v.is_finite()) {
        return Err(invalid("risk_model", "non-finite feature importance".to_string()));
    }

    validate_classifier("severity_model", &parts.severity)?;
    check_feature_width("severity_model", parts.severity.n_features())?;
    if !parts.severity_decoder.covers(parts.severity.classes()) {
        return Err(invalid(
            "severity_encoder",
            "severity_model emits codes the encoder cannot decode".to_string(),
        ));
    }

    validate_classifier("outage_model", &parts.outage)?;
    check_feature_width("outage_model", parts.outage.n_features())?;
    if !parts.outage_decoder.covers(parts.outage.classes()) {
        return Err(invalid(
            "outage_encoder",
            "outage_model emits codes the encoder cannot decode".to_string(),
        ));
    }

    Ok(())
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use crate::logic::features::layout::{default_values, FEATURES};
    use crate::logic::model::artifacts::{DecisionTree, TreeNode};

    /// Directory of the sample artifacts shipped with the repo
    pub const SAMPLE_MODEL_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/models");

    /// Small deterministic store. At the default readings every scaled
    /// value is 0, so: risk 35, severity "Normal", outage "Compressor Failure".
    pub fn parts() -> ModelParts {
        let scale: Vec<f64> = FEATURES.iter().map(|f| (f.max - f.min) / 4.0).collect();

        let mut risk_coef = vec![0.0; FEATURE_COUNT];
        risk_coef[3] = 12.0; // GasLeak
        risk_coef[5] = 8.0; // Vibration
        risk_coef[11] = 6.0; // Maintenance
        risk_coef[7] = 4.0; // BearingTemp

        let mut high = vec![0.0; FEATURE_COUNT];
        high[3] = 2.0;
        high[5] = 1.5;
        let mut medium = vec![0.0; FEATURE_COUNT];
        medium[11] = 1.0;
        medium[9] = 1.0;

        ModelParts {
            scaler: Scaler::Standard {
                mean: default_values().to_vec(),
                scale,
            },
            risk: Regressor::Linear {
                coefficients: risk_coef,
                intercept: 35.0,
                feature_importances: None,
            },
            severity: Classifier::Linear {
                classes: vec![0, 1, 2, 3],
                coefficients: vec![high, vec![0.0; FEATURE_COUNT], medium, vec![0.0; FEATURE_COUNT]],
                intercepts: vec![-1.0, 0.2, 0.1, 0.8],
            },
            outage: Classifier::Forest {
                classes: vec![0, 1, 2],
                n_features: FEATURE_COUNT,
                trees: vec![DecisionTree {
                    nodes: vec![
                        TreeNode::Split { feature: 3, threshold: 1.0, left: 1, right: 4 },
                        TreeNode::Split { feature: 14, threshold: 1.0, left: 2, right: 3 },
                        TreeNode::Leaf { value: vec![6.0, 1.0, 1.0] },
                        TreeNode::Leaf { value: vec![1.0, 6.0, 1.0] },
                        TreeNode::Leaf { value: vec![1.0, 1.0, 8.0] },
                    ],
                }],
            },
            severity_decoder: LabelEncoder {
                classes: ["HIGH", "Low", "Medium", "Normal"].map(String::from).to_vec(),
            },
            outage_decoder: LabelEncoder {
                classes: ["Compressor Failure", "Electrical Fault", "Pipeline Leak"]
                    .map(String::from)
                    .to_vec(),
            },
        }
    }

    pub fn store() -> ModelStore {
        ModelStore::from_parts(parts()).expect("fixture store is valid")
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_fixture_is_valid() {
        let store = store();
        assert_eq!(store.info().source, "<memory>");
        assert_eq!(store.top_features(8).len(), 8);
    }

    #[test]
    fn test_load_sample_artifacts() {
        let store = ModelStore::load(SAMPLE_MODEL_DIR).unwrap();
        let info = store.info();
        assert_eq!(info.artifacts.len(), 6);
        assert!(info.artifacts.iter().all(|a| a.sha256.len() == 64));
        assert_eq!(store.risk().kind(), "forest");
        assert_eq!(store.scaler().n_features(), FEATURE_COUNT);
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let err = ModelStore::load("/nonexistent/model/dir").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_wrong_scaler_width_rejected() {
        let mut parts = parts();
        parts.scaler = Scaler::Standard {
            mean: vec![0.0; 14],
            scale: vec![1.0; 14],
        };
        let err = ModelStore::from_parts(parts).unwrap_err();
        assert!(err.to_string().contains("scaler"));
    }

    #[test]
    fn test_undecodable_codes_rejected() {
        let mut parts = parts();
        parts.severity_decoder = LabelEncoder {
            classes: vec!["HIGH".to_string(), "Low".to_string()],
        };
        let err = ModelStore::from_parts(parts).unwrap_err();
        assert!(err.to_string().contains("severity_encoder"));
    }

    #[test]
    fn test_importance_width_checked() {
        let mut parts = parts();
        parts.risk = Regressor::Linear {
            coefficients: vec![1.0; FEATURE_COUNT],
            intercept: 0.0,
            feature_importances: Some(vec![0.1; 3]),
        };
        assert!(ModelStore::from_parts(parts).is_err());
    }
}
