//! Dashboard logic: features, models, batch tables

pub mod batch;
pub mod features;
pub mod importance;
pub mod model;
pub mod severity;
