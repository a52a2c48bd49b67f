//! Decision explanations via deterministic path attribution.
//!
//! For each tree, walking the decision path from root to leaf changes the
//! node-mean repayment rate at every split; that change is credited to the
//! split's feature. Summing per feature and averaging over trees gives an
//! additive decomposition of the predicted probability around the root
//! mean. Exact and deterministic: identical (artifact, vector) inputs
//! always produce the identical ordered driver list.

use crate::features::{FeatureVector, FEATURE_NAMES};
use crate::model::{ModelArtifact, TreeNode};
use crate::types::{FactorDirection, ScoreFactor};

/// Ranked drivers plus any non-fatal notes.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub factors: Vec<ScoreFactor>,
    pub warnings: Vec<String>,
}

/// Rank features by absolute contribution to the predicted probability and
/// return the top `top_k`, tagged with direction and a plain-language
/// description.
///
/// A degenerate vector (no event signal at all) cannot be meaningfully
/// attributed; that returns an empty driver list with a warning rather
/// than an error.
pub fn explain(artifact: &ModelArtifact, vector: &FeatureVector, top_k: usize) -> Explanation {
    if vector.is_all_sentinel() {
        return Explanation {
            factors: Vec::new(),
            warnings: vec![
                "feature vector has no event-derived signal; attribution skipped".to_string(),
            ],
        };
    }

    let row = vector.to_f64_row();
    let mut contributions = vec![0.0f64; row.len()];
    for tree in &artifact.forest.trees {
        attribute_path(tree, &row, &mut contributions);
    }
    let n_trees = artifact.forest.trees.len().max(1) as f64;
    for c in contributions.iter_mut() {
        *c /= n_trees;
    }

    // Sort by descending |contribution|; ties resolve in schema order so
    // the output is stable across calls.
    let mut ranked: Vec<usize> = (0..contributions.len()).collect();
    ranked.sort_by(|&a, &b| {
        contributions[b]
            .abs()
            .partial_cmp(&contributions[a].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let factors = ranked
        .into_iter()
        .filter(|&i| contributions[i] != 0.0)
        .take(top_k)
        .map(|i| {
            let name = FEATURE_NAMES.get(i).copied().unwrap_or("unknown_feature");
            ScoreFactor {
                feature: name.to_string(),
                direction: if contributions[i] > 0.0 {
                    FactorDirection::IncreasesScore
                } else {
                    FactorDirection::DecreasesScore
                },
                magnitude: contributions[i].abs(),
                description: describe_feature(name).to_string(),
            }
        })
        .collect();

    Explanation {
        factors,
        warnings: Vec::new(),
    }
}

/// Walk one tree's decision path, crediting each split feature with the
/// change in node mean.
fn attribute_path(tree: &TreeNode, row: &[f64], contributions: &mut [f64]) {
    let mut node = tree;
    loop {
        match node {
            TreeNode::Leaf { .. } => return,
            TreeNode::Split {
                feature,
                threshold,
                value,
                left,
                right,
            } => {
                let child: &TreeNode = if row.get(*feature).copied().unwrap_or(0.0) <= *threshold {
                    left
                } else {
                    right
                };
                if let Some(c) = contributions.get_mut(*feature) {
                    *c += child.value() - value;
                }
                node = child;
            }
        }
    }
}

/// Loan-officer-facing description of each factor.
fn describe_feature(name: &str) -> &'static str {
    match name {
        "revenue_avg_3m" => "Average monthly revenue over the last quarter.",
        "revenue_avg_6m" => "Average monthly revenue over the last half year.",
        "revenue_avg_12m" => "Average monthly revenue over the last year.",
        "revenue_cv_12m" => "Consistency of monthly revenue. High variation suggests an unstable business.",
        "net_cash_flow_12m" => "Total money left after expenses (profitability).",
        "burn_rate_12m" => "Ratio of expenses to income. A high burn rate means spending too fast.",
        "opex_ratio_12m" => "Share of revenue consumed by operating expenses.",
        "txn_count_12m" => "Total number of transactions (business volume).",
        "txn_per_month_3m" => "Recent transaction frequency per month.",
        "txn_avg_amount_12m" => "Average size of individual transactions.",
        "inflow_total_12m" => "Total money coming in (revenue).",
        "outflow_total_12m" => "Total money going out (expenses).",
        "revenue_concentration_12m" => "Dependence on the single largest customer type. High concentration is fragile.",
        "channel_diversity" => "Number of distinct payment channels in use.",
        "has_ad_data" => "Whether the business advertises at all.",
        "ad_spend_12m" => "Total investment in marketing.",
        "ad_cpa_12m" => "Cost to acquire a customer. Lower is better.",
        "ad_roas_12m" => "Return on ad spend. Measures marketing efficiency.",
        "ad_ctr_12m" => "How often ad impressions turn into clicks.",
        "ad_spend_trend" => "Direction of recent marketing investment.",
        "age_months" => "How long the business has been operating.",
        "sector_code" => "Industry sector of the business.",
        "size_code" => "Size category of the business.",
        "registration_code" => "Formal registration status.",
        _ => "No description available.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::features::FEATURE_SCHEMA_VERSION;
    use crate::metrics::ValidationMetrics;
    use crate::model::{ArtifactStatus, ForestParams, RandomForest};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn sentinel_vector() -> FeatureVector {
        FeatureVector {
            revenue_avg_3m: Decimal::ZERO,
            revenue_avg_6m: Decimal::ZERO,
            revenue_avg_12m: Decimal::ZERO,
            revenue_cv_12m: Decimal::ZERO,
            net_cash_flow_12m: Decimal::ZERO,
            burn_rate_12m: Decimal::ZERO,
            opex_ratio_12m: Decimal::ZERO,
            txn_count_12m: Decimal::ZERO,
            txn_per_month_3m: Decimal::ZERO,
            txn_avg_amount_12m: Decimal::ZERO,
            inflow_total_12m: Decimal::ZERO,
            outflow_total_12m: Decimal::ZERO,
            revenue_concentration_12m: Decimal::ZERO,
            channel_diversity: Decimal::ZERO,
            has_ad_data: Decimal::ZERO,
            ad_spend_12m: Decimal::ZERO,
            ad_cpa_12m: Decimal::ZERO,
            ad_roas_12m: Decimal::ZERO,
            ad_ctr_12m: Decimal::ZERO,
            ad_spend_trend: Decimal::ZERO,
            age_months: dec!(24),
            sector_code: dec!(3),
            size_code: dec!(2),
            registration_code: dec!(3),
        }
    }

    fn healthy_vector() -> FeatureVector {
        let mut v = sentinel_vector();
        v.revenue_avg_12m = dec!(50_000);
        v.net_cash_flow_12m = dec!(200_000);
        v.txn_count_12m = dec!(400);
        v.inflow_total_12m = dec!(600_000);
        v.outflow_total_12m = dec!(400_000);
        v.burn_rate_12m = dec!(0.6);
        v
    }

    fn struggling_vector() -> FeatureVector {
        let mut v = sentinel_vector();
        v.revenue_avg_12m = dec!(5_000);
        v.net_cash_flow_12m = dec!(-100_000);
        v.txn_count_12m = dec!(40);
        v.inflow_total_12m = dec!(60_000);
        v.outflow_total_12m = dec!(160_000);
        v.burn_rate_12m = dec!(2.5);
        v
    }

    fn trained_artifact() -> ModelArtifact {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..15 {
            let mut v = healthy_vector();
            v.net_cash_flow_12m += Decimal::from(i * 1000);
            rows.push(v.to_f64_row());
            labels.push(true);
            let mut w = struggling_vector();
            w.net_cash_flow_12m -= Decimal::from(i * 1000);
            rows.push(w.to_f64_row());
            labels.push(false);
        }
        let forest = RandomForest::fit(
            &rows,
            &labels,
            ForestParams {
                n_trees: 20,
                max_depth: 4,
                min_leaf: 1,
                seed: 42,
            },
        )
        .unwrap();
        ModelArtifact {
            version: "v-test".to_string(),
            schema_version: FEATURE_SCHEMA_VERSION.to_string(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            feature_config: FeatureConfig::default(),
            forest,
            trained_through: NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
            validation: ValidationMetrics {
                auc_roc: 1.0,
                gini: 1.0,
                precision: 1.0,
                recall: 1.0,
                f1: 1.0,
                n_observations: 30,
                n_repaid: 15,
                n_defaulted: 15,
            },
            status: ArtifactStatus::Accepted,
        }
    }

    #[test]
    fn test_factors_sorted_by_descending_magnitude() {
        let artifact = trained_artifact();
        let explanation = explain(&artifact, &healthy_vector(), 5);
        let mags: Vec<f64> = explanation.factors.iter().map(|f| f.magnitude).collect();
        for pair in mags.windows(2) {
            assert!(pair[0] >= pair[1], "factors not sorted: {mags:?}");
        }
    }

    #[test]
    fn test_identical_inputs_identical_output() {
        let artifact = trained_artifact();
        let a = explain(&artifact, &healthy_vector(), 3);
        let b = explain(&artifact, &healthy_vector(), 3);
        let names_a: Vec<_> = a.factors.iter().map(|f| &f.feature).collect();
        let names_b: Vec<_> = b.factors.iter().map(|f| &f.feature).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn test_top_k_bounds_output() {
        let artifact = trained_artifact();
        let explanation = explain(&artifact, &healthy_vector(), 3);
        assert!(explanation.factors.len() <= 3);
        assert!(!explanation.factors.is_empty());
    }

    #[test]
    fn test_healthy_vector_top_driver_increases_score() {
        let artifact = trained_artifact();
        let explanation = explain(&artifact, &healthy_vector(), 3);
        assert_eq!(
            explanation.factors[0].direction,
            FactorDirection::IncreasesScore
        );
    }

    #[test]
    fn test_struggling_vector_top_driver_decreases_score() {
        let artifact = trained_artifact();
        let explanation = explain(&artifact, &struggling_vector(), 3);
        assert_eq!(
            explanation.factors[0].direction,
            FactorDirection::DecreasesScore
        );
    }

    #[test]
    fn test_degenerate_vector_gives_empty_drivers_with_warning() {
        let artifact = trained_artifact();
        let explanation = explain(&artifact, &sentinel_vector(), 3);
        assert!(explanation.factors.is_empty());
        assert_eq!(explanation.warnings.len(), 1);
    }

    #[test]
    fn test_attribution_sums_to_probability_minus_root_mean() {
        let artifact = trained_artifact();
        let vector = healthy_vector();
        let row = vector.to_f64_row();

        let mut contributions = vec![0.0f64; row.len()];
        for tree in &artifact.forest.trees {
            attribute_path(tree, &row, &mut contributions);
        }
        let n = artifact.forest.trees.len() as f64;
        let total: f64 = contributions.iter().sum::<f64>() / n;
        let root_mean: f64 =
            artifact.forest.trees.iter().map(|t| t.value()).sum::<f64>() / n;
        let predicted = artifact.forest.predict_proba(&row);
        assert!(
            (root_mean + total - predicted).abs() < 1e-9,
            "additivity broken: {} + {} vs {}",
            root_mean,
            total,
            predicted
        );
    }
}
