//! In-memory registry of model artifacts keyed by version.
//!
//! Versions are immutable: saving over an existing version is rejected, so
//! two training runs targeting the same version cannot silently merge.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ScoreEngineError, TrainingError};
use crate::model::artifact::ModelArtifact;
use crate::ScoreEngineResult;

#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<String, Arc<ModelArtifact>>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact under its version. Fails on collision.
    pub fn save(&mut self, artifact: ModelArtifact) -> ScoreEngineResult<Arc<ModelArtifact>> {
        if self.artifacts.contains_key(&artifact.version) {
            return Err(TrainingError::VersionCollision(artifact.version.clone()).into());
        }
        let handle = Arc::new(artifact);
        self.artifacts.insert(handle.version.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Look up an artifact by version id.
    pub fn load(&self, version: &str) -> ScoreEngineResult<Arc<ModelArtifact>> {
        self.artifacts.get(version).cloned().ok_or_else(|| {
            ScoreEngineError::InvalidInput {
                field: "version".to_string(),
                reason: format!("no artifact registered under '{version}'"),
            }
        })
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }
}
