//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! The scaler and all three predictors were fit on the columns in exactly
//! this order. CSV uploads must carry these column names, in this order.
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE SPEC
// ============================================================================

/// One bounded reading on the input panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSpec {
    /// Column name (CSV header, JSON key, form field)
    pub name: &'static str,
    /// Human label with unit
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
}

impl FeatureSpec {
    const fn new(
        name: &'static str,
        label: &'static str,
        min: f64,
        max: f64,
        default: f64,
        step: f64,
    ) -> Self {
        Self { name, label, min, max, default, step }
    }

    /// Clamp a raw reading into the control range
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Features in exact model order
/// This is the SINGLE SOURCE OF TRUTH for feature layout
pub const FEATURES: [FeatureSpec; FEATURE_COUNT] = [
    // === Process (0-4) ===
    FeatureSpec::new("Pressure", "Pressure (bar)", 40.0, 120.0, 80.0, 0.1),
    FeatureSpec::new("Temperature", "Temperature (°C)", -20.0, 80.0, 30.0, 0.1),
    FeatureSpec::new("Flow", "Flow Rate (m³/hr)", 100.0, 1500.0, 600.0, 1.0),
    FeatureSpec::new("GasLeak", "Gas Leak (ppm)", 0.0, 500.0, 50.0, 1.0),
    FeatureSpec::new("Valve", "Valve Position (%)", 0.0, 100.0, 50.0, 0.5),

    // === Rotating equipment (5-9) ===
    FeatureSpec::new("Vibration", "Vibration (mm/s)", 0.0, 12.0, 3.0, 0.1),
    FeatureSpec::new("RPM", "Compressor RPM", 1500.0, 5000.0, 3000.0, 10.0),
    FeatureSpec::new("BearingTemp", "Bearing Temperature (°C)", 40.0, 120.0, 70.0, 0.5),
    FeatureSpec::new("OilPressure", "Lubrication Oil Pressure (bar)", 2.0, 8.0, 5.0, 0.1),
    FeatureSpec::new("Corrosion", "Corrosion Rate (mm/year)", 0.0, 2.5, 0.5, 0.01),

    // === Asset condition / utilities (10-14) ===
    FeatureSpec::new("Age", "Equipment Age (years)", 1.0, 30.0, 10.0, 1.0),
    FeatureSpec::new("Maintenance", "Maintenance Overdue (days)", 0.0, 180.0, 10.0, 1.0),
    FeatureSpec::new("Inspection", "Inspection Risk Score", 0.0, 100.0, 20.0, 0.5),
    FeatureSpec::new("Energy", "Energy Consumption (kWh)", 1000.0, 10000.0, 4000.0, 10.0),
    FeatureSpec::new("Voltage", "Voltage Fluctuation (%)", 0.0, 15.0, 3.0, 0.1),
];

/// Total number of features
pub const FEATURE_COUNT: usize = 15;

/// Index of "Equipment Age"
pub const AGE_INDEX: usize = 10;

/// Index of "Maintenance Overdue"
pub const MAINTENANCE_INDEX: usize = 11;

/// Column names in layout order
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    FEATURES.iter().map(|f| f.name)
}

/// Default reading for every feature, in layout order
pub fn default_values() -> [f64; FEATURE_COUNT] {
    let mut values = [0.0; FEATURE_COUNT];
    for (slot, spec) in values.iter_mut().zip(FEATURES.iter()) {
        *slot = spec.default;
    }
    values
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
/// Used to detect layout mismatches at runtime
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in feature_names() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub features: Vec<FeatureInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub name: String,
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            features: FEATURES
                .iter()
                .map(|f| FeatureInfo {
                    name: f.name.to_string(),
                    label: f.label.to_string(),
                    min: f.min,
                    max: f.max,
                    default: f.default,
                    step: f.step,
                })
                .collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by column name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURES.iter().position(|f| f.name == name)
}

/// Get column name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURES.get(index).map(|f| f.name)
}

// ============================================================================
// TESTS
// ============================================================================
