//! The scoring model: a seeded random-forest classifier, its versioned
//! artifact, and the probability-to-score mapping.

mod artifact;
mod forest;
mod registry;
mod scoring;

pub use artifact::{ArtifactStatus, ModelArtifact};
pub use forest::{ForestParams, RandomForest, TreeNode};
pub use registry::ArtifactRegistry;
pub use scoring::{probability_to_score, score_vector};
