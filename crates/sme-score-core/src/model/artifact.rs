//! Versioned, immutable model artifacts.
//!
//! Persistence mechanics (file, database) belong to the surrounding system;
//! the artifact is plain serde data so that system can store it wherever it
//! likes and hand it back by version id.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::FeatureConfig;
use crate::metrics::ValidationMetrics;
use crate::model::forest::RandomForest;

/// Whether the artifact passed its validation gate. Rejected artifacts are
/// kept for audit but must not be used for scoring decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactStatus {
    Accepted,
    Rejected,
}

/// A trained model snapshot. Never mutated after creation; re-training
/// produces a new version instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    /// Feature schema the forest was trained against. Scoring with a
    /// vector from a different schema version is a contract violation.
    pub schema_version: String,
    pub feature_names: Vec<String>,
    /// Feature semantics knobs, frozen at training time so inference
    /// computes vectors identically.
    pub feature_config: FeatureConfig,
    pub forest: RandomForest,
    pub trained_through: NaiveDate,
    pub validation: ValidationMetrics,
    pub status: ArtifactStatus,
}

impl ModelArtifact {
    pub fn is_accepted(&self) -> bool {
        self.status == ArtifactStatus::Accepted
    }
}
