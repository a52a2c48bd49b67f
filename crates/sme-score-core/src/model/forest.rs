//! Random-forest classifier over f64 feature rows.
//!
//! Everything that involves randomness (bootstrap resampling, feature
//! subsampling) flows from a single seeded `StdRng`, so a (data, params)
//! pair always produces the same forest. Class imbalance is handled with
//! inverse-class-frequency weights computed once at fit time and recorded
//! on the model; they are never re-tuned per run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::TrainingError;

/// Tree-growing parameters. Defaults come from
/// [`crate::config::TrainingConfig`] and are fixed there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_leaf: usize,
    pub seed: u64,
}

/// A node of one decision tree. Internal nodes keep their training-set mean
/// so that path attribution can read the change in expectation at each
/// split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        /// Weighted repayment rate of training samples in this leaf.
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        /// Weighted repayment rate of training samples reaching this node.
        value: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn value(&self) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split { value, .. } => *value,
        }
    }
}

/// A fitted ensemble. Immutable after `fit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: ForestParams,
    pub n_features: usize,
    /// (weight for repaid, weight for defaulted), inverse class frequency.
    pub class_weights: (f64, f64),
    pub trees: Vec<TreeNode>,
}

impl RandomForest {
    /// Fit the forest on `rows` with binary labels (`true` = repaid).
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[bool],
        params: ForestParams,
    ) -> Result<Self, TrainingError> {
        let n = rows.len();
        if n == 0 {
            return Err(TrainingError::InsufficientExamples {
                found: 0,
                required: 1,
            });
        }
        let n_pos = labels.iter().filter(|l| **l).count();
        let n_neg = n - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Err(TrainingError::DegenerateLabels {
                split: "train".to_string(),
                label: if n_neg == 0 { "repaid" } else { "defaulted" }.to_string(),
            });
        }

        let n_features = rows[0].len();
        // Inverse class frequency, normalised so weights average to 1.
        let class_weights = (
            n as f64 / (2.0 * n_pos as f64),
            n as f64 / (2.0 * n_neg as f64),
        );
        let mtry = (n_features as f64).sqrt().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(grow_tree(
                rows,
                labels,
                class_weights,
                &indices,
                0,
                &params,
                mtry,
                &mut rng,
            ));
        }

        Ok(RandomForest {
            params,
            n_features,
            class_weights,
            trees,
        })
    }

    /// Probability of repayment: mean leaf value across trees. Always in
    /// [0, 1] because every leaf value is a weighted rate in [0, 1].
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| predict_tree(t, row)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }
}

fn predict_tree(node: &TreeNode, row: &[f64]) -> f64 {
    match node {
        TreeNode::Leaf { value } => *value,
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
            ..
        } => {
            if row.get(*feature).copied().unwrap_or(0.0) <= *threshold {
                predict_tree(left, row)
            } else {
                predict_tree(right, row)
            }
        }
    }
}

fn weighted_rate(labels: &[bool], weights: (f64, f64), indices: &[usize]) -> f64 {
    let mut pos = 0.0;
    let mut total = 0.0;
    for &i in indices {
        let w = if labels[i] { weights.0 } else { weights.1 };
        total += w;
        if labels[i] {
            pos += w;
        }
    }
    if total > 0.0 {
        pos / total
    } else {
        0.0
    }
}

/// Binary Gini impurity of a weighted sample: 2p(1-p).
fn gini(pos_weight: f64, total_weight: f64) -> f64 {
    if total_weight <= 0.0 {
        return 0.0;
    }
    let p = pos_weight / total_weight;
    2.0 * p * (1.0 - p)
}

#[allow(clippy::too_many_arguments)]
fn grow_tree(
    rows: &[Vec<f64>],
    labels: &[bool],
    weights: (f64, f64),
    indices: &[usize],
    depth: usize,
    params: &ForestParams,
    mtry: usize,
    rng: &mut StdRng,
) -> TreeNode {
    let value = weighted_rate(labels, weights, indices);
    let pure = indices.iter().all(|&i| labels[i]) || indices.iter().all(|&i| !labels[i]);
    if depth >= params.max_depth || indices.len() < 2 * params.min_leaf || pure {
        return TreeNode::Leaf { value };
    }

    let n_features = rows[0].len();
    let candidates = sample_features(n_features, mtry, rng);

    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, score)
    for &feature in &candidates {
        if let Some((threshold, score)) = best_split_on(rows, labels, weights, indices, feature) {
            let better = match best {
                None => true,
                Some((_, _, best_score)) => score < best_score,
            };
            if better {
                best = Some((feature, threshold, score));
            }
        }
    }

    let Some((feature, threshold, score)) = best else {
        return TreeNode::Leaf { value };
    };

    // No impurity gain: stop rather than split on noise.
    let parent_total: f64 = indices
        .iter()
        .map(|&i| if labels[i] { weights.0 } else { weights.1 })
        .sum();
    let parent_pos: f64 = indices
        .iter()
        .filter(|&&i| labels[i])
        .map(|_| weights.0)
        .sum();
    if score >= gini(parent_pos, parent_total) - 1e-12 {
        return TreeNode::Leaf { value };
    }

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| rows[i][feature] <= threshold);
    if left_idx.len() < params.min_leaf || right_idx.len() < params.min_leaf {
        return TreeNode::Leaf { value };
    }

    let left = grow_tree(rows, labels, weights, &left_idx, depth + 1, params, mtry, rng);
    let right = grow_tree(rows, labels, weights, &right_idx, depth + 1, params, mtry, rng);
    TreeNode::Split {
        feature,
        threshold,
        value,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Draw `mtry` distinct feature indices, returned sorted so evaluation
/// order never depends on draw order.
fn sample_features(n_features: usize, mtry: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..n_features).collect();
    let take = mtry.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        pool.swap(i, j);
    }
    let mut chosen = pool[..take].to_vec();
    chosen.sort_unstable();
    chosen
}

/// Best threshold for one feature: midpoints between consecutive distinct
/// values, scored by weighted Gini of the resulting partition. Lower is
/// better. Returns None when the feature is constant on this sample.
fn best_split_on(
    rows: &[Vec<f64>],
    labels: &[bool],
    weights: (f64, f64),
    indices: &[usize],
    feature: usize,
) -> Option<(f64, f64)> {
    let mut sorted: Vec<(f64, bool)> = indices
        .iter()
        .map(|&i| (rows[i][feature], labels[i]))
        .collect();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let total_pos: f64 = sorted
        .iter()
        .filter(|(_, l)| *l)
        .map(|_| weights.0)
        .sum();
    let total_all: f64 = sorted
        .iter()
        .map(|(_, l)| if *l { weights.0 } else { weights.1 })
        .sum();

    let mut left_pos = 0.0;
    let mut left_all = 0.0;
    let mut best: Option<(f64, f64)> = None;

    for window in 0..sorted.len() - 1 {
        let (v, label) = sorted[window];
        let w = if label { weights.0 } else { weights.1 };
        left_all += w;
        if label {
            left_pos += w;
        }
        let next_v = sorted[window + 1].0;
        if next_v <= v {
            continue;
        }
        let threshold = (v + next_v) / 2.0;
        let right_pos = total_pos - left_pos;
        let right_all = total_all - left_all;
        let score = (left_all * gini(left_pos, left_all) + right_all * gini(right_pos, right_all))
            / total_all;
        let better = match best {
            None => true,
            Some((_, best_score)) => score < best_score,
        };
        if better {
            best = Some((threshold, score));
        }
    }
    best
}
