//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MODEL_DIR, DEFAULT_PORT};
use crate::logic::features::FeatureWeighting;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Directory holding the six model artifacts
    pub model_dir: PathBuf,

    /// Pre-scaling multipliers (legacy dashboard behaviour)
    pub feature_weighting: FeatureWeighting,

    /// Optional non-blocking delay before results are returned
    pub processing_delay: Duration,

    /// Upload body limit in bytes
    pub max_upload_bytes: usize,

    /// Environment (development, production)
    pub environment: String,

    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            feature_weighting: FeatureWeighting::None,
            processing_delay: Duration::ZERO,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let feature_weighting = match lookup("FEATURE_WEIGHTING") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; using 'none'", e);
                FeatureWeighting::None
            }),
            None => defaults.feature_weighting,
        };

        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_dir: lookup("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),

            feature_weighting,

            processing_delay: lookup("PROCESSING_DELAY_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.processing_delay),

            max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                .and_then(|b| b.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),

            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),

            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
