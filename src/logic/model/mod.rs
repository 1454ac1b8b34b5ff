//! Model Module - artifact loading and the inference pipeline
//!
//! Artifacts are opaque outputs of the training pipeline; this module only
//! loads, validates and evaluates them.

pub mod artifacts;
pub mod inference;
pub mod store;

// Re-export common types
pub use artifacts::ModelError;
pub use inference::{Pipeline, PredictionResult};
pub use store::{ModelStore, ModelStoreInfo};
