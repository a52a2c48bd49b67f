//! Validation metrics for a trained classifier on a held-out split.
//!
//! AUC-ROC uses trapezoidal integration with tied-score handling; the
//! remaining metrics are computed at the fixed 0.5 probability threshold.
//! Metrics run in f64 alongside the ensemble itself.

use serde::{Deserialize, Serialize};

use crate::error::TrainingError;

/// One held-out observation: predicted probability of repayment and the
/// actual outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub predicted: f64,
    pub repaid: bool,
}

/// Discrimination and classification quality on the held-out split.
/// `repaid` is the positive class throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub auc_roc: f64,
    /// Gini coefficient: 2*AUC - 1.
    pub gini: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub n_observations: usize,
    pub n_repaid: usize,
    pub n_defaulted: usize,
}

/// Compute all validation metrics. Fails when the split contains only one
/// class: discrimination is undefined there.
pub fn compute_metrics(observations: &[Observation]) -> Result<ValidationMetrics, TrainingError> {
    let n_repaid = observations.iter().filter(|o| o.repaid).count();
    let n_defaulted = observations.len() - n_repaid;
    if n_repaid == 0 || n_defaulted == 0 {
        return Err(TrainingError::DegenerateLabels {
            split: "validation".to_string(),
            label: if n_defaulted == 0 { "repaid" } else { "defaulted" }.to_string(),
        });
    }

    let auc_roc = auc_roc(observations);
    let (precision, recall, f1) = threshold_metrics(observations, 0.5);

    Ok(ValidationMetrics {
        auc_roc,
        gini: 2.0 * auc_roc - 1.0,
        precision,
        recall,
        f1,
        n_observations: observations.len(),
        n_repaid,
        n_defaulted,
    })
}

/// AUC via the trapezoidal rule over the ROC curve, processing tied
/// predicted scores as a single step.
fn auc_roc(observations: &[Observation]) -> f64 {
    let mut sorted: Vec<(f64, bool)> = observations.iter().map(|o| (o.predicted, o.repaid)).collect();
    sorted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let total_pos = sorted.iter().filter(|(_, r)| *r).count() as f64;
    let total_neg = sorted.len() as f64 - total_pos;

    let mut auc = 0.0;
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut prev_tp = 0.0;
    let mut prev_fp = 0.0;

    let mut i = 0usize;
    while i < sorted.len() {
        let current = sorted[i].0;
        while i < sorted.len() && sorted[i].0 == current {
            if sorted[i].1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        let tpr = tp / total_pos;
        let fpr = fp / total_neg;
        auc += (fpr - prev_fp / total_neg) * (tpr + prev_tp / total_pos) / 2.0;
        prev_tp = tp;
        prev_fp = fp;
    }
    auc
}

fn threshold_metrics(observations: &[Observation], threshold: f64) -> (f64, f64, f64) {
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut fn_ = 0.0;
    for o in observations {
        let predicted_pos = o.predicted >= threshold;
        match (predicted_pos, o.repaid) {
            (true, true) => tp += 1.0,
            (true, false) => fp += 1.0,
            (false, true) => fn_ += 1.0,
            (false, false) => {}
        }
    }
    let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
    let recall = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    (precision, recall, f1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(predicted: f64, repaid: bool) -> Observation {
        Observation { predicted, repaid }
    }

    #[test]
    fn test_perfect_separation_auc_is_one() {
        let observations = vec![
            obs(0.9, true),
            obs(0.8, true),
            obs(0.2, false),
            obs(0.1, false),
        ];
        let m = compute_metrics(&observations).unwrap();
        assert!((m.auc_roc - 1.0).abs() < 1e-12);
        assert!((m.gini - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_ranking_auc_is_zero() {
        let observations = vec![obs(0.1, true), obs(0.9, false)];
        let m = compute_metrics(&observations).unwrap();
        assert!(m.auc_roc.abs() < 1e-12);
    }

    #[test]
    fn test_all_tied_scores_auc_is_half() {
        let observations = vec![obs(0.5, true), obs(0.5, false), obs(0.5, true), obs(0.5, false)];
        let m = compute_metrics(&observations).unwrap();
        assert!((m.auc_roc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_is_degenerate() {
        let observations = vec![obs(0.9, true), obs(0.8, true)];
        let err = compute_metrics(&observations).unwrap_err();
        assert!(matches!(err, TrainingError::DegenerateLabels { .. }));
    }

    #[test]
    fn test_threshold_metrics_counts() {
        // tp=1 (0.9/repaid), fp=1 (0.7/default), fn=1 (0.3/repaid), tn=1
        let observations = vec![
            obs(0.9, true),
            obs(0.7, false),
            obs(0.3, true),
            obs(0.2, false),
        ];
        let m = compute_metrics(&observations).unwrap();
        assert!((m.precision - 0.5).abs() < 1e-12);
        assert!((m.recall - 0.5).abs() < 1e-12);
        assert!((m.f1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_auc_in_unit_interval() {
        let observations = vec![
            obs(0.7, true),
            obs(0.6, false),
            obs(0.55, true),
            obs(0.4, true),
            obs(0.3, false),
        ];
        let m = compute_metrics(&observations).unwrap();
        assert!(m.auc_roc >= 0.0 && m.auc_roc <= 1.0);
    }
}
