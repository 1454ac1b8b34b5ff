//! Model Artifacts - scaler, predictors and label decoders
//!
//! Artifacts are exported from the training pipeline as JSON, tagged by
//! `"kind"`. Every predictor works on a whole matrix (one row per record),
//! the single-record path is a one-row matrix.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("{decoder} has no label for class code {code}")]
    UnknownCode { decoder: &'static str, code: i64 },

    #[error("invalid artifact {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn check_width(expected: usize, x: &ArrayView2<f64>) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::ShapeMismatch {
            expected,
            actual: x.ncols(),
        });
    }
    Ok(())
}

/// Index of the largest value, first one wins on ties, NaN never wins
fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

// ============================================================================
// SCALER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`, zero scale treated as 1
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `(x - min) / (max - min)`, zero range treated as 1
    MinMax { min_vals: Vec<f64>, max_vals: Vec<f64> },
}

impl Scaler {
    pub fn kind(&self) -> &'static str {
        match self {
            Scaler::Standard { .. } => "standard",
            Scaler::MinMax { .. } => "min_max",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Scaler::Standard { mean, .. } => mean.len(),
            Scaler::MinMax { min_vals, .. } => min_vals.len(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        let (a, b) = match self {
            Scaler::Standard { mean, scale } => (mean, scale),
            Scaler::MinMax { min_vals, max_vals } => (min_vals, max_vals),
        };
        if a.len() != b.len() {
            return Err(format!("parameter lengths differ ({} vs {})", a.len(), b.len()));
        }
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err("non-finite parameter".to_string());
        }
        if let Scaler::MinMax { .. } = self {
            if let Some(j) = a.iter().zip(b).position(|(min, max)| max < min) {
                return Err(format!("max below min for feature {}", j));
            }
        }
        Ok(())
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        check_width(self.n_features(), &x)?;

        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = match self {
                    Scaler::Standard { mean, scale } => {
                        let s = if scale[j] == 0.0 { 1.0 } else { scale[j] };
                        (*value - mean[j]) / s
                    }
                    Scaler::MinMax { min_vals, max_vals } => {
                        let range = max_vals[j] - min_vals[j];
                        let range = if range == 0.0 { 1.0 } else { range };
                        (*value - min_vals[j]) / range
                    }
                };
            }
        }
        Ok(out)
    }
}

// ============================================================================
// DECISION TREE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf.
    /// Children always sit after their parent, so the walk terminates.
    fn leaf(&self, row: ArrayView1<f64>) -> Result<&[f64], ModelError> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(value.as_slice()),
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let x = row.get(*feature).copied().ok_or(ModelError::ShapeMismatch {
                        expected: feature + 1,
                        actual: row.len(),
                    })?;
                    let next = if x <= *threshold { *left } else { *right };
                    if next <= index {
                        return Err(ModelError::Invalid {
                            name: "tree",
                            reason: format!("node {} points backwards to {}", index, next),
                        });
                    }
                    index = next;
                }
                None => {
                    return Err(ModelError::Invalid {
                        name: "tree",
                        reason: format!("missing node {}", index),
                    })
                }
            }
        }
    }

    fn validate(&self, n_features: usize, leaf_width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on feature {}", i, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has non-finite threshold", i));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", i, child));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.iter().any(|v| !v.is_finite()) {
                        return Err(format!("leaf {} has a non-finite value", i));
                    }
                    if value.len() != leaf_width {
                        return Err(format!(
                            "leaf {} has {} values, expected {}",
                            i,
                            value.len(),
                            leaf_width
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// REGRESSOR
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default)]
        feature_importances: Option<Vec<f64>>,
    },
    /// Mean of the tree leaves
    Forest {
        trees: Vec<DecisionTree>,
        feature_importances: Vec<f64>,
    },
}

impl Regressor {
    pub fn kind(&self) -> &'static str {
        match self {
            Regressor::Linear { .. } => "linear",
            Regressor::Forest { .. } => "forest",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Regressor::Linear { coefficients, .. } => coefficients.len(),
            Regressor::Forest { feature_importances, .. } => feature_importances.len(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(imp) = self.explicit_importances() {
            if imp.len() != self.n_features() {
                return Err(format!(
                    "{} importances for {} features",
                    imp.len(),
                    self.n_features()
                ));
            }
        }
        match self {
            Regressor::Linear { coefficients, intercept, .. } => {
                if coefficients.iter().any(|c| !c.is_finite()) || !intercept.is_finite() {
                    return Err("non-finite coefficient".to_string());
                }
            }
            Regressor::Forest { trees, .. } => {
                if trees.is_empty() {
                    return Err("forest has no trees".to_string());
                }
                for tree in trees {
                    tree.validate(self.n_features(), 1)?;
                }
            }
        }
        Ok(())
    }

    fn explicit_importances(&self) -> Option<&[f64]> {
        match self {
            Regressor::Linear { feature_importances, .. } => feature_importances.as_deref(),
            Regressor::Forest { feature_importances, .. } => Some(feature_importances),
        }
    }

    /// Static per-feature importance vector.
    /// Linear models without exported importances use normalised |coefficient|.
    pub fn feature_importances(&self) -> Vec<f64> {
        if let Some(imp) = self.explicit_importances() {
            return imp.to_vec();
        }
        match self {
            Regressor::Linear { coefficients, .. } => {
                let total: f64 = coefficients.iter().map(|c| c.abs()).sum();
                if total == 0.0 {
                    vec![0.0; coefficients.len()]
                } else {
                    coefficients.iter().map(|c| c.abs() / total).collect()
                }
            }
            Regressor::Forest { feature_importances, .. } => feature_importances.clone(),
        }
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        check_width(self.n_features(), &x)?;

        match self {
            Regressor::Linear { coefficients, intercept, .. } => {
                let coef = ArrayView1::from(coefficients.as_slice());
                Ok(x.dot(&coef) + *intercept)
            }
            Regressor::Forest { trees, .. } => {
                let mut out = Array1::zeros(x.nrows());
                for (i, row) in x.rows().into_iter().enumerate() {
                    let mut sum = 0.0;
                    for tree in trees {
                        sum += tree.leaf(row)?.first().copied().unwrap_or(0.0);
                    }
                    out[i] = sum / trees.len() as f64;
                }
                Ok(out)
            }
        }
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    /// One coefficient row per class; a single row means binary
    /// (positive decision → `classes[1]`)
    Linear {
        classes: Vec<i64>,
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    /// Leaves hold per-class counts or probabilities
    Forest {
        classes: Vec<i64>,
        n_features: usize,
        trees: Vec<DecisionTree>,
    },
}

impl Classifier {
    pub fn kind(&self) -> &'static str {
        match self {
            Classifier::Linear { .. } => "linear",
            Classifier::Forest { .. } => "forest",
        }
    }

    pub fn classes(&self) -> &[i64] {
        match self {
            Classifier::Linear { classes, .. } | Classifier::Forest { classes, .. } => classes,
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Classifier::Linear { coefficients, .. } => {
                coefficients.first().map(|r| r.len()).unwrap_or(0)
            }
            Classifier::Forest { n_features, .. } => *n_features,
        }
    }

    fn validate(&self) -> Result<(), String> {
        let n_classes = self.classes().len();
        if n_classes < 2 {
            return Err("fewer than two classes".to_string());
        }
        match self {
            Classifier::Linear { coefficients, intercepts, .. } => {
                let binary = coefficients.len() == 1 && n_classes == 2;
                if !binary && coefficients.len() != n_classes {
                    return Err(format!(
                        "{} coefficient rows for {} classes",
                        coefficients.len(),
                        n_classes
                    ));
                }
                if intercepts.len() != coefficients.len() {
                    return Err("intercepts do not match coefficient rows".to_string());
                }
                let width = self.n_features();
                if coefficients.iter().any(|r| r.len() != width) {
                    return Err("ragged coefficient rows".to_string());
                }
                if coefficients.iter().flatten().chain(intercepts).any(|v| !v.is_finite()) {
                    return Err("non-finite coefficient".to_string());
                }
            }
            Classifier::Forest { trees, n_features, .. } => {
                if trees.is_empty() {
                    return Err("forest has no trees".to_string());
                }
                for tree in trees {
                    tree.validate(*n_features, n_classes)?;
                }
            }
        }
        Ok(())
    }

    /// Predict one class code per row
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<i64>, ModelError> {
        check_width(self.n_features(), &x)?;

        let classes = self.classes();
        let mut codes = Vec::with_capacity(x.nrows());

        for row in x.rows() {
            let index = match self {
                Classifier::Linear { coefficients, intercepts, .. } => {
                    let decision: Vec<f64> = coefficients
                        .iter()
                        .zip(intercepts)
                        .map(|(coef, b)| row.dot(&ArrayView1::from(coef.as_slice())) + b)
                        .collect();
                    if decision.len() == 1 {
                        usize::from(decision[0] > 0.0)
                    } else {
                        argmax(&decision).unwrap_or(0)
                    }
                }
                Classifier::Forest { trees, .. } => {
                    let mut proba = vec![0.0; classes.len()];
                    for tree in trees {
                        let leaf = tree.leaf(row)?;
                        let total: f64 = leaf.iter().sum();
                        if total > 0.0 {
                            for (p, v) in proba.iter_mut().zip(leaf) {
                                *p += v / total;
                            }
                        }
                    }
                    argmax(&proba).unwrap_or(0)
                }
            };
            codes.push(classes[index]);
        }

        Ok(codes)
    }
}

// ============================================================================
// LABEL DECODER
// ============================================================================

/// Maps class codes back to the label strings the models were trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn inverse_transform(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }

    pub fn covers(&self, codes: &[i64]) -> bool {
        codes.iter().all(|&c| self.inverse_transform(c).is_some())
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

pub(crate) fn invalid(name: &'static str, reason: String) -> ModelError {
    ModelError::Invalid { name, reason }
}

pub(crate) fn validate_scaler(s: &Scaler) -> Result<(), ModelError> {
    s.validate().map_err(|r| invalid("scaler", r))
}

pub(crate) fn validate_regressor(name: &'static str, r: &Regressor) -> Result<(), ModelError> {
    r.validate().map_err(|reason| invalid(name, reason))
}

pub(crate) fn validate_classifier(name: &'static str, c: &Classifier) -> Result<(), ModelError> {
    c.validate().map_err(|reason| invalid(name, reason))
}

// ============================================================================
// TESTS
// ============================================================================
