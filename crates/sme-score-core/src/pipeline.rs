//! Offline training pipeline: normalize → label → feature → fit → validate.
//!
//! The holdout split is time-based, not random: the most recent loans by
//! disbursement date validate a model trained only on earlier loans,
//! mirroring the leakage constraint the engine lives under in production.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::TrainingConfig;
use crate::dataset::{normalize_bundle, NormalizedBundle, RawBundle};
use crate::error::{ScoreEngineError, TrainingError};
use crate::features::{build_features, FEATURE_NAMES, FEATURE_SCHEMA_VERSION};
use crate::labels::build_labels;
use crate::metrics::{compute_metrics, Observation};
use crate::model::{
    ArtifactRegistry, ArtifactStatus, ForestParams, ModelArtifact, RandomForest,
};
use crate::types::DataQualityWarning;
use crate::ScoreEngineResult;

/// The result of one training run. The artifact may carry `Rejected`
/// status when validation fell below the configured AUC floor; rejected
/// artifacts are kept for audit but must not score.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub artifact: ModelArtifact,
    /// Data-quality warnings from normalization plus loans skipped for
    /// missing pre-disbursement data.
    pub warnings: Vec<DataQualityWarning>,
}

/// Train a model end to end and register the accepted artifact.
///
/// Fails with a `Training` error when examples are insufficient, labels
/// are degenerate, validation AUC is below the configured minimum, or the
/// target version already exists.
pub fn train(
    raw: &RawBundle,
    config: &TrainingConfig,
    registry: &mut ArtifactRegistry,
) -> ScoreEngineResult<std::sync::Arc<ModelArtifact>> {
    let run = run_training(raw, config)?;
    if !run.artifact.is_accepted() {
        return Err(TrainingError::BelowAucThreshold {
            auc: run.artifact.validation.auc_roc,
            min_auc: config.min_auc,
        }
        .into());
    }
    registry.save(run.artifact)
}

/// Run the pipeline without touching a registry. Returns the run even when
/// the artifact is rejected, so callers can inspect the metrics.
pub fn run_training(raw: &RawBundle, config: &TrainingConfig) -> ScoreEngineResult<TrainingRun> {
    let bundle = normalize_bundle(raw)?;
    let mut warnings = bundle.warnings.clone();

    let examples = assemble_examples(&bundle, config, &mut warnings)?;
    if examples.len() < config.min_examples {
        return Err(TrainingError::InsufficientExamples {
            found: examples.len(),
            required: config.min_examples,
        }
        .into());
    }

    let (train_set, valid_set) = time_split(examples, config.holdout_fraction);
    info!(
        train = train_set.len(),
        validation = valid_set.len(),
        "time-based split complete"
    );
    if valid_set.is_empty() || train_set.is_empty() {
        return Err(TrainingError::InsufficientExamples {
            found: train_set.len() + valid_set.len(),
            required: config.min_examples,
        }
        .into());
    }

    let rows: Vec<Vec<f64>> = train_set.iter().map(|e| e.row.clone()).collect();
    let labels: Vec<bool> = train_set.iter().map(|e| e.repaid).collect();
    let forest = RandomForest::fit(
        &rows,
        &labels,
        ForestParams {
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            min_leaf: config.min_leaf,
            seed: config.seed,
        },
    )
    .map_err(ScoreEngineError::Training)?;

    let observations: Vec<Observation> = valid_set
        .iter()
        .map(|e| Observation {
            predicted: forest.predict_proba(&e.row),
            repaid: e.repaid,
        })
        .collect();
    let validation = compute_metrics(&observations).map_err(ScoreEngineError::Training)?;

    let status = if validation.auc_roc >= config.min_auc {
        ArtifactStatus::Accepted
    } else {
        warn!(
            auc = validation.auc_roc,
            min_auc = config.min_auc,
            "validation AUC below floor; artifact rejected"
        );
        ArtifactStatus::Rejected
    };
    info!(
        version = %config.version,
        auc = validation.auc_roc,
        f1 = validation.f1,
        ?status,
        "training run complete"
    );

    let trained_through = train_set
        .iter()
        .map(|e| e.as_of)
        .max()
        .unwrap_or(NaiveDate::MIN);

    Ok(TrainingRun {
        artifact: ModelArtifact {
            version: config.version.clone(),
            schema_version: FEATURE_SCHEMA_VERSION.to_string(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            feature_config: config.features.clone(),
            forest,
            trained_through,
            validation,
            status,
        },
        warnings,
    })
}

struct Example {
    as_of: NaiveDate,
    row: Vec<f64>,
    repaid: bool,
}

/// One (features, label) pair per loan, features computed strictly as of
/// the loan's disbursement date. Loans whose business has no profile or no
/// visible pre-disbursement data are skipped with a warning.
fn assemble_examples(
    bundle: &NormalizedBundle,
    config: &TrainingConfig,
    warnings: &mut Vec<DataQualityWarning>,
) -> ScoreEngineResult<Vec<Example>> {
    let labeled = build_labels(bundle.all_loans(), config.grace_period_days);
    let mut examples = Vec::with_capacity(labeled.len());

    for loan in &labeled {
        let Some(profile) = bundle.profiles.get(&loan.business_id) else {
            warnings.push(DataQualityWarning::new(
                "loan_repayment",
                Some(&loan.business_id),
                format!("loan '{}' skipped: no business profile", loan.loan_id),
            ));
            continue;
        };
        match build_features(profile, bundle, loan.as_of, &config.features) {
            Ok(vector) => {
                // A business whose events all post-date the disbursement
                // yields an all-sentinel vector; training on it would pair
                // zero signal with a real outcome.
                if vector.is_all_sentinel() {
                    warnings.push(DataQualityWarning::new(
                        "loan_repayment",
                        Some(&loan.business_id),
                        format!(
                            "loan '{}' skipped: no visible data before disbursement",
                            loan.loan_id
                        ),
                    ));
                    continue;
                }
                examples.push(Example {
                    as_of: loan.as_of,
                    row: vector.to_f64_row(),
                    repaid: loan.repaid,
                });
            }
            Err(ScoreEngineError::FeatureSchema { business_id, reason }) => {
                warnings.push(DataQualityWarning::new(
                    "loan_repayment",
                    Some(&business_id),
                    format!("loan '{}' skipped: {reason}", loan.loan_id),
                ));
            }
            Err(other) => return Err(other),
        }
    }

    // Deterministic chronological order for the split.
    examples.sort_by_key(|e| e.as_of);
    Ok(examples)
}

/// Train on the earliest loans, validate on the most recent
/// `holdout_fraction` of them.
fn time_split(examples: Vec<Example>, holdout_fraction: f64) -> (Vec<Example>, Vec<Example>) {
    let n = examples.len();
    let n_holdout = ((n as f64 * holdout_fraction).round() as usize).clamp(1, n.saturating_sub(1));
    let split_at = n - n_holdout;
    let mut examples = examples;
    let valid = examples.split_off(split_at);
    (examples, valid)
}
