//! Feature engineering: fixed-width vectors from per-business series.

mod builder;
mod schema;

pub use builder::build_features;
pub use schema::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES, FEATURE_SCHEMA_VERSION};
