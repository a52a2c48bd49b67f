use thiserror::Error;

/// Fatal errors surfaced to callers of the scoring engine.
///
/// Row-level data-quality issues are *not* errors: they are recovered at the
/// normalizer boundary and reported as [`crate::types::DataQualityWarning`]s.
#[derive(Debug, Error)]
pub enum ScoreEngineError {
    #[error("Schema error in table '{table}': {reason}")]
    Schema { table: String, reason: String },

    #[error("No business profile found for id '{0}'")]
    BusinessNotFound(String),

    #[error("Feature schema violation for business '{business_id}': {reason}")]
    FeatureSchema { business_id: String, reason: String },

    #[error("No trained model artifact is loaded")]
    ModelNotTrained,

    #[error("Training failed: {0}")]
    Training(#[from] TrainingError),

    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Diagnostics for a failed training run. Fatal to the run, never to the
/// process; the caller decides whether to retry with different data or
/// configuration.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Insufficient training examples: {found} labeled loans, need at least {required}")]
    InsufficientExamples { found: usize, required: usize },

    #[error("Degenerate label distribution in {split} split: all labels are '{label}'")]
    DegenerateLabels { split: String, label: String },

    #[error("Validation AUC {auc:.4} below minimum acceptable threshold {min_auc:.4}")]
    BelowAucThreshold { auc: f64, min_auc: f64 },

    #[error("Artifact version '{0}' already exists; versions are immutable")]
    VersionCollision(String),
}

impl From<serde_json::Error> for ScoreEngineError {
    fn from(e: serde_json::Error) -> Self {
        ScoreEngineError::Serialization(e.to_string())
    }
}
