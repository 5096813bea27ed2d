//! XGBoost-style gradient boosting with second-order split scoring.
//!
//! - Leaf weights are regularised: w* = -G / (H + lambda)
//! - Splits are scored by Gain = 0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - (GL+GR)²/(HL+HR+λ)]
//!   and only kept when the gain exceeds gamma
//! - Squared-error loss, so every hessian is 1 and min_child_weight is a row count

use super::regressor::{FittedRegressor, Regressor, check_training_shape};
use crate::domain::errors::ModelError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTreesParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    /// L2 regularisation on leaf weights
    pub reg_lambda: f64,
    /// Minimum loss reduction to make a split
    pub gamma: f64,
    pub subsample: f64,
    pub seed: u64,
}

impl Default for BoostedTreesParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
            subsample: 1.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            Node::Leaf { weight } => *weight,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a BoostedTreesParams,
}

impl TreeBuilder<'_> {
    fn build(&self, indices: &[usize], depth: usize) -> Node {
        let g_sum: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h_sum: f64 = indices.iter().map(|&i| self.hess[i]).sum();
        let weight = -g_sum / (h_sum + self.params.reg_lambda);

        if depth >= self.params.max_depth || indices.len() < 2 || h_sum < self.params.min_child_weight
        {
            return Node::Leaf { weight };
        }

        let width = self.x[indices[0]].len();
        let best = (0..width)
            .filter_map(|f| self.best_split_for_feature(indices, f, g_sum, h_sum))
            .max_by(|a, b| a.gain.partial_cmp(&b.gain).unwrap_or(Ordering::Equal));

        match best {
            Some(split) if split.gain > self.params.gamma => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| self.x[i][split.feature] <= split.threshold);

                if left_idx.is_empty() || right_idx.is_empty() {
                    return Node::Leaf { weight };
                }

                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(self.build(&left_idx, depth + 1)),
                    right: Box::new(self.build(&right_idx, depth + 1)),
                }
            }
            _ => Node::Leaf { weight },
        }
    }

    /// Exact greedy scan over the sorted values of one feature.
    fn best_split_for_feature(
        &self,
        indices: &[usize],
        feature: usize,
        g_total: f64,
        h_total: f64,
    ) -> Option<SplitCandidate> {
        let mut sorted = indices.to_vec();
        sorted.sort_by(|&a, &b| {
            self.x[a][feature]
                .partial_cmp(&self.x[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let lambda = self.params.reg_lambda;
        let parent_score = g_total * g_total / (h_total + lambda);
        let mut g_left = 0.0;
        let mut h_left = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for pos in 0..sorted.len() - 1 {
            let idx = sorted[pos];
            g_left += self.grad[idx];
            h_left += self.hess[idx];

            let value = self.x[idx][feature];
            let next_value = self.x[sorted[pos + 1]][feature];
            if (next_value - value).abs() < 1e-12 {
                continue;
            }

            let g_right = g_total - g_left;
            let h_right = h_total - h_left;
            if h_left < self.params.min_child_weight || h_right < self.params.min_child_weight {
                continue;
            }

            let gain = 0.5
                * (g_left * g_left / (h_left + lambda) + g_right * g_right / (h_right + lambda)
                    - parent_score);

            if best.as_ref().is_none_or(|b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (value + next_value) / 2.0,
                    gain,
                });
            }
        }
        best
    }
}

/// Regularised boosted trees in the style of XGBoost.
pub struct BoostedTreesModel {
    params: BoostedTreesParams,
}

impl BoostedTreesModel {
    pub const NAME: &'static str = "XGBoost";

    pub fn new(params: BoostedTreesParams) -> Self {
        Self { params }
    }

    fn sample_rows(&self, rng: &mut StdRng, n: usize) -> Vec<usize> {
        if self.params.subsample >= 1.0 {
            return (0..n).collect();
        }
        let rows: Vec<usize> = (0..n)
            .filter(|_| rng.random::<f64>() < self.params.subsample)
            .collect();
        if rows.is_empty() { (0..n).collect() } else { rows }
    }
}

impl Regressor for BoostedTreesModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[f64],
    ) -> Result<Box<dyn FittedRegressor>, ModelError> {
        check_training_shape(features, labels)?;
        if features.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ModelError::Fit {
                model: Self::NAME.to_string(),
                reason: "non-finite feature value".to_string(),
            });
        }

        let n = labels.len();
        let base_score = labels.iter().sum::<f64>() / n as f64;
        let mut preds = vec![base_score; n];
        let hess = vec![1.0; n];
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for _ in 0..self.params.n_estimators {
            let grad: Vec<f64> = preds.iter().zip(labels.iter()).map(|(p, y)| p - y).collect();
            let rows = self.sample_rows(&mut rng, n);

            let builder = TreeBuilder {
                x: features,
                grad: &grad,
                hess: &hess,
                params: &self.params,
            };
            let tree = builder.build(&rows, 0);

            for (i, p) in preds.iter_mut().enumerate() {
                *p += self.params.learning_rate * tree.predict(&features[i]);
            }
            trees.push(tree);
        }

        debug!(
            "{}: fitted {} trees on {} rows",
            Self::NAME,
            trees.len(),
            n
        );

        Ok(Box::new(FittedBoostedTrees {
            base_score,
            learning_rate: self.params.learning_rate,
            width: features[0].len(),
            trees,
        }))
    }
}

struct FittedBoostedTrees {
    base_score: f64,
    learning_rate: f64,
    width: usize,
    trees: Vec<Node>,
}

impl FittedRegressor for FittedBoostedTrees {
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        features
            .iter()
            .map(|row| {
                if row.len() != self.width {
                    return Err(ModelError::Predict {
                        model: BoostedTreesModel::NAME.to_string(),
                        reason: format!("expected {} features, got {}", self.width, row.len()),
                    });
                }
                Ok(self.base_score
                    + self
                        .trees
                        .iter()
                        .map(|t| self.learning_rate * t.predict(row))
                        .sum::<f64>())
            })
            .collect()
    }
}
