//! Configuration for feature computation and training runs.
//!
//! Every default is fixed and stated here rather than tuned per run, so a
//! training run is reproducible from (data, config, seed) alone.

use serde::{Deserialize, Serialize};

/// Knobs that change feature semantics. These must be identical at train
/// and inference time; they are embedded into the model artifact for that
/// reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Assumed average order value used to estimate ad-driven revenue when
    /// computing return on ad spend.
    #[serde(default = "default_average_order_value")]
    pub average_order_value: u64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            average_order_value: default_average_order_value(),
        }
    }
}

fn default_average_order_value() -> u64 {
    5_000
}

/// Configuration for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Version tag for the produced artifact. Collisions are rejected.
    pub version: String,
    /// Days past the due date within which a repayment still counts as
    /// on time.
    #[serde(default)]
    pub grace_period_days: u32,
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_leaf")]
    pub min_leaf: usize,
    /// Seed for bootstrap sampling and feature subsampling. Fixed default
    /// so two runs over the same data produce the same forest.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Fraction of labeled loans (most recent by disbursement date) held
    /// out for validation.
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f64,
    /// Minimum acceptable validation ROC-AUC. Below this the artifact is
    /// marked rejected and the run fails.
    #[serde(default = "default_min_auc")]
    pub min_auc: f64,
    #[serde(default = "default_min_examples")]
    pub min_examples: usize,
    #[serde(default)]
    pub features: FeatureConfig,
}

impl TrainingConfig {
    pub fn with_version(version: impl Into<String>) -> Self {
        TrainingConfig {
            version: version.into(),
            grace_period_days: 0,
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            min_leaf: default_min_leaf(),
            seed: default_seed(),
            holdout_fraction: default_holdout_fraction(),
            min_auc: default_min_auc(),
            min_examples: default_min_examples(),
            features: FeatureConfig::default(),
        }
    }
}

fn default_n_trees() -> usize {
    100
}

fn default_max_depth() -> usize {
    5
}

fn default_min_leaf() -> usize {
    2
}

fn default_seed() -> u64 {
    42
}

fn default_holdout_fraction() -> f64 {
    0.3
}

fn default_min_auc() -> f64 {
    0.60
}

fn default_min_examples() -> usize {
    10
}
