//! Feature Importance - ranked view of the risk model's importances

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::logic::features::feature_name;

/// Number of bars on the dashboard chart
pub const TOP_FEATURES: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub name: String,
    pub importance: f64,
}

/// Pair importances with feature names, sort descending, keep the first `n`.
/// Ties keep layout order, NaN sorts last.
pub fn top_features(importances: &[f64], n: usize) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = importances
        .iter()
        .enumerate()
        .map(|(i, &importance)| FeatureImportance {
            name: feature_name(i).unwrap_or("unknown").to_string(),
            importance,
        })
        .collect();

    ranked.sort_by(|a, b| match (a.importance.is_nan(), b.importance.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b
            .importance
            .partial_cmp(&a.importance)
            .unwrap_or(Ordering::Equal),
    });

    ranked.truncate(n);
    ranked
}
