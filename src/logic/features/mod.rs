//! Features Module - Input schema and feature vectors

pub mod layout;
pub mod vector;

pub use layout::{feature_name, LayoutInfo, FEATURES, FEATURE_COUNT};
pub use vector::{FeatureVector, FeatureWeighting, InputError};
