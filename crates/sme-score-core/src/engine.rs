//! The scoring facade consumed by the external API layer.
//!
//! One engine instance holds a normalized data snapshot and at most one
//! loaded model artifact. Scoring is a pure read: concurrent requests for
//! different businesses share the snapshot and artifact without locking.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::dataset::{normalize_bundle, NormalizedBundle, RawBundle};
use crate::error::ScoreEngineError;
use crate::explain::explain;
use crate::features::build_features;
use crate::model::{score_vector, ModelArtifact};
use crate::types::{FactorDirection, RiskTier, ScoreFactor, ScoreResult};
use crate::ScoreEngineResult;

/// Default number of top factors attached to a score.
const DEFAULT_TOP_K: usize = 3;

pub struct ScoringEngine {
    bundle: NormalizedBundle,
    artifact: Option<Arc<ModelArtifact>>,
    top_k_factors: usize,
}

impl ScoringEngine {
    pub fn new(bundle: NormalizedBundle) -> Self {
        ScoringEngine {
            bundle,
            artifact: None,
            top_k_factors: DEFAULT_TOP_K,
        }
    }

    /// Normalize raw row tables and build an engine over them.
    pub fn from_raw(raw: &RawBundle) -> ScoreEngineResult<Self> {
        Ok(Self::new(normalize_bundle(raw)?))
    }

    /// Swap in a trained artifact. The artifact is shared and immutable;
    /// loading never mutates it.
    pub fn load_artifact(&mut self, artifact: Arc<ModelArtifact>) {
        self.artifact = Some(artifact);
    }

    pub fn with_top_k_factors(mut self, top_k: usize) -> Self {
        self.top_k_factors = top_k;
        self
    }

    /// Data-quality warnings recorded when the snapshot was normalized.
    pub fn data_warnings(&self) -> &[crate::types::DataQualityWarning] {
        &self.bundle.warnings
    }

    /// Score one business as of a cutoff date.
    ///
    /// Fails with `BusinessNotFound` for an unknown id, `FeatureSchema`
    /// for a known business with no event data, and `ModelNotTrained`
    /// when no artifact is loaded. A failure never degrades into a
    /// default score or tier.
    pub fn score(&self, business_id: &str, as_of: NaiveDate) -> ScoreEngineResult<ScoreResult> {
        let profile = self
            .bundle
            .profiles
            .get(business_id)
            .ok_or_else(|| ScoreEngineError::BusinessNotFound(business_id.to_string()))?;
        let artifact = self.artifact.as_ref().ok_or(ScoreEngineError::ModelNotTrained)?;

        let vector = build_features(profile, &self.bundle, as_of, &artifact.feature_config)?;
        let (probability, credit_score, risk_tier) = score_vector(artifact, &vector)?;
        let explanation = explain(artifact, &vector, self.top_k_factors);
        let decision_summary = summarize(risk_tier, &explanation.factors);

        Ok(ScoreResult {
            business_id: business_id.to_string(),
            as_of_date: as_of,
            model_version: artifact.version.clone(),
            probability,
            credit_score,
            risk_tier,
            top_factors: explanation.factors,
            decision_summary,
            warnings: explanation.warnings,
        })
    }
}

/// One-sentence summary for loan officers, assembled from the top factors.
fn summarize(tier: RiskTier, factors: &[ScoreFactor]) -> String {
    if factors.is_empty() {
        return format!("This business is categorized as {tier} based on aggregate risk factors.");
    }
    let reasons: Vec<&str> = factors.iter().map(|f| short_label(f)).collect();
    let joiner = match tier {
        RiskTier::Low => "driven by",
        _ => "due to",
    };
    format!(
        "This business has a {tier} score {joiner} {}.",
        reasons.join(", ")
    )
}

fn short_label(factor: &ScoreFactor) -> &'static str {
    let positive = factor.direction == FactorDirection::IncreasesScore;
    match factor.feature.as_str() {
        "net_cash_flow_12m" => {
            if positive {
                "strong cash flow"
            } else {
                "weak cash flow"
            }
        }
        "revenue_avg_3m" | "revenue_avg_6m" | "revenue_avg_12m" => {
            if positive {
                "healthy revenue levels"
            } else {
                "low revenue levels"
            }
        }
        "revenue_cv_12m" => {
            if positive {
                "stable revenue"
            } else {
                "volatile revenue"
            }
        }
        "burn_rate_12m" => {
            if positive {
                "disciplined spending"
            } else {
                "high burn rate"
            }
        }
        "opex_ratio_12m" => {
            if positive {
                "lean operating costs"
            } else {
                "heavy operating costs"
            }
        }
        "txn_count_12m" | "txn_per_month_3m" => {
            if positive {
                "consistent transaction activity"
            } else {
                "sparse transaction activity"
            }
        }
        "inflow_total_12m" | "txn_avg_amount_12m" => {
            if positive {
                "solid incoming payments"
            } else {
                "thin incoming payments"
            }
        }
        "outflow_total_12m" => {
            if positive {
                "contained outgoings"
            } else {
                "heavy outgoings"
            }
        }
        "revenue_concentration_12m" => {
            if positive {
                "diversified customer base"
            } else {
                "concentrated customer base"
            }
        }
        "ad_roas_12m" | "ad_ctr_12m" => {
            if positive {
                "efficient marketing"
            } else {
                "inefficient marketing"
            }
        }
        "ad_cpa_12m" => {
            if positive {
                "cheap customer acquisition"
            } else {
                "costly customer acquisition"
            }
        }
        "ad_spend_12m" | "ad_spend_trend" | "has_ad_data" => {
            if positive {
                "active market presence"
            } else {
                "limited market presence"
            }
        }
        "age_months" => {
            if positive {
                "operational maturity"
            } else {
                "limited operating history"
            }
        }
        _ => {
            if positive {
                "supportive business profile"
            } else {
                "unfavourable business profile"
            }
        }
    }
}
