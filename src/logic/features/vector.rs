//! Feature Vector - Core data structure for model input
//!
//! Built from the input panel (or a JSON body). Values are always in
//! `FEATURES` order and all 15 are always present.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::layout::{
    default_values, feature_index, layout_hash, AGE_INDEX, FEATURES, FEATURE_COUNT,
    FEATURE_VERSION, MAINTENANCE_INDEX,
};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },
}

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURES
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Vector with every reading at its documented default
    pub fn defaults() -> Self {
        Self::from_values(default_values())
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Read the input panel.
    ///
    /// Missing readings keep their default, present readings are clamped to
    /// the control range. Unknown names and non-finite values are rejected.
    pub fn from_readings<'a, I>(readings: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut values = default_values();

        for (name, value) in readings {
            let index = feature_index(name)
                .ok_or_else(|| InputError::UnknownFeature(name.to_string()))?;

            if !value.is_finite() {
                return Err(InputError::InvalidValue {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }

            values[index] = FEATURES[index].clamp(value);
        }

        Ok(Self::from_values(values))
    }

    /// Same as [`FeatureVector::from_readings`] for raw text fields (HTML form)
    pub fn from_text_fields<'a, I>(fields: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut parsed = Vec::with_capacity(FEATURE_COUNT);

        for (name, raw) in fields {
            if feature_index(name).is_none() {
                return Err(InputError::UnknownFeature(name.to_string()));
            }
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value = trimmed.parse::<f64>().map_err(|_| InputError::InvalidValue {
                name: name.to_string(),
                value: raw.to_string(),
            })?;
            parsed.push((name, value));
        }

        Self::from_readings(parsed)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Get feature by column name
    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.values[i])
    }

    /// Named values for logging and JSON responses
    pub fn named_values(&self) -> Vec<(&'static str, f64)> {
        FEATURES.iter().map(|f| f.name).zip(self.values).collect()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::defaults()
    }
}

// ============================================================================
// FEATURE WEIGHTING
// ============================================================================

/// Pre-scaling multipliers.
///
/// `Legacy` reproduces the dashboard build that scaled Maintenance Overdue
/// by 2.3 and Equipment Age by 2.0 before the scaler. Off unless configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureWeighting {
    #[default]
    None,
    Legacy,
}

pub const LEGACY_MAINTENANCE_FACTOR: f64 = 2.3;
pub const LEGACY_AGE_FACTOR: f64 = 2.0;

impl FeatureWeighting {
    /// (feature index, multiplier) pairs applied to raw readings
    pub fn factors(&self) -> &'static [(usize, f64)] {
        match self {
            FeatureWeighting::None => &[],
            FeatureWeighting::Legacy => &[
                (MAINTENANCE_INDEX, LEGACY_MAINTENANCE_FACTOR),
                (AGE_INDEX, LEGACY_AGE_FACTOR),
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureWeighting::None => "none",
            FeatureWeighting::Legacy => "legacy",
        }
    }
}

impl FromStr for FeatureWeighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "off" => Ok(FeatureWeighting::None),
            "legacy" => Ok(FeatureWeighting::Legacy),
            other => Err(format!("unknown feature weighting '{}'", other)),
        }
    }
}

impl std::fmt::Display for FeatureWeighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_readings_take_defaults() {
        let vector = FeatureVector::from_readings([("Pressure", 95.0)]).unwrap();
        assert_eq!(vector.get_by_name("Pressure"), Some(95.0));
        assert_eq!(vector.get_by_name("Energy"), Some(4000.0));
        assert!(vector.layout_hash == layout_hash());
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let vector =
            FeatureVector::from_readings([("Vibration", 40.0), ("Temperature", -90.0)]).unwrap();
        assert_eq!(vector.get_by_name("Vibration"), Some(12.0));
        assert_eq!(vector.get_by_name("Temperature"), Some(-20.0));
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let err = FeatureVector::from_readings([("Humidity", 1.0)]).unwrap_err();
        assert_eq!(err, InputError::UnknownFeature("Humidity".to_string()));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(FeatureVector::from_readings([("Valve", f64::NAN)]).is_err());
    }

    #[test]
    fn test_text_fields() {
        let vector =
            FeatureVector::from_text_fields([("RPM", " 4200 "), ("Corrosion", "")]).unwrap();
        assert_eq!(vector.get_by_name("RPM"), Some(4200.0));
        assert_eq!(vector.get_by_name("Corrosion"), Some(0.5));

        let err = FeatureVector::from_text_fields([("RPM", "fast")]).unwrap_err();
        assert!(matches!(err, InputError::InvalidValue { .. }));
    }

    #[test]
    fn test_legacy_weighting() {
        let mut row = default_values();
        for &(index, factor) in FeatureWeighting::Legacy.factors() {
            row[index] *= factor;
        }
        assert!((row[MAINTENANCE_INDEX] - 23.0).abs() < 1e-9);
        assert!((row[AGE_INDEX] - 20.0).abs() < 1e-9);
        assert_eq!(row[0], 80.0);

        assert!(FeatureWeighting::None.factors().is_empty());
    }

    #[test]
    fn test_weighting_from_str() {
        assert_eq!("LEGACY".parse::<FeatureWeighting>(), Ok(FeatureWeighting::Legacy));
        assert_eq!("none".parse::<FeatureWeighting>(), Ok(FeatureWeighting::None));
        assert!("double".parse::<FeatureWeighting>().is_err());
    }
}
