//! Central Configuration Constants
//!
//! Single source of truth for defaults and artifact file names.

/// App name
pub const APP_NAME: &str = "Outage Intelligence Dashboard";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default model artifact directory
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Default upload limit (2 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

// ============================================
// Model artifact file names
// ============================================

pub const RISK_MODEL_FILE: &str = "risk_model.json";
pub const SEVERITY_MODEL_FILE: &str = "severity_model.json";
pub const OUTAGE_MODEL_FILE: &str = "outage_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const SEVERITY_ENCODER_FILE: &str = "severity_encoder.json";
pub const OUTAGE_ENCODER_FILE: &str = "outage_encoder.json";

// ============================================
// Batch output columns
// ============================================

pub const RISK_SCORE_COLUMN: &str = "Risk_Score";
pub const SEVERITY_COLUMN: &str = "Severity";
pub const OUTAGE_TYPE_COLUMN: &str = "Outage_Type";
