//! Gradient boosted trees with logistic loss
//!
//! Trees are grown greedily on second order statistics; every leaf holds the
//! Newton step `-G / (H + lambda)`. A missing value (NaN) always goes to the
//! right child. Fitting needs the `gbm` feature; a stored booster can be
//! evaluated either way.

use serde::{Deserialize, Serialize};

/// GBM hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbmParams {
    /// Number of boosting iterations (trees)
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Minimum samples required in a leaf node
    pub min_samples_leaf: usize,
    /// L2 regularization on leaf weights
    pub lambda: f64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_leaf: 5,
            lambda: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Node arena, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Checks the arena is non-empty and every split points forward to an
    /// existing node, so `predict` always ends on a leaf.
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (at, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {} splits on unknown feature {}", at, feature));
                }
                for child in [*left, *right] {
                    if child <= at || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child {}", at, child));
                    }
                }
            }
        }
        Ok(())
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row.get(*feature).copied().unwrap_or(f64::NAN);
                    // NaN compares false and falls through to the right
                    at = if x <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booster {
    params: GbmParams,
    n_features: usize,
    /// Initial log-odds
    base_score: f64,
    trees: Vec<Tree>,
}

impl Booster {
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &GbmParams {
        &self.params
    }

    /// Structural check for a booster read from disk
    pub fn validate(&self) -> Result<(), String> {
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }

    fn raw_score(&self, row: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|t| self.params.learning_rate * t.predict(row))
                .sum::<f64>()
    }

    /// Probability of the positive class per row
    pub fn predict_proba(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| sigmoid(self.raw_score(row))).collect()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(feature = "gbm")]
impl Booster {
    /// Fits on row-major `rows` against binary `labels` (0.0 / 1.0).
    pub fn fit(rows: &[Vec<f64>], labels: &[f64], params: GbmParams) -> Self {
        let n_features = rows.first().map(|r| r.len()).unwrap_or(0);
        let mean = if labels.is_empty() {
            0.5
        } else {
            labels.iter().sum::<f64>() / labels.len() as f64
        };
        let p0 = mean.clamp(1e-6, 1.0 - 1e-6);
        let base_score = (p0 / (1.0 - p0)).ln();

        let mut booster = Booster {
            params,
            n_features,
            base_score,
            trees: Vec::new(),
        };
        let mut scores = vec![base_score; rows.len()];
        let all: Vec<usize> = (0..rows.len()).collect();

        for _ in 0..booster.params.n_estimators {
            let mut grad = Vec::with_capacity(rows.len());
            let mut hess = Vec::with_capacity(rows.len());
            for (score, &y) in scores.iter().zip(labels) {
                let p = sigmoid(*score);
                grad.push(p - y);
                hess.push((p * (1.0 - p)).max(1e-16));
            }

            let mut builder = TreeBuilder {
                rows,
                grad: &grad,
                hess: &hess,
                params: &booster.params,
                nodes: Vec::new(),
            };
            builder.grow(&all, 0);
            let tree = Tree {
                nodes: builder.nodes,
            };

            for (score, row) in scores.iter_mut().zip(rows) {
                *score += booster.params.learning_rate * tree.predict(row);
            }
            booster.trees.push(tree);
        }

        booster
    }
}

#[cfg(feature = "gbm")]
struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a GbmParams,
    nodes: Vec<Node>,
}

#[cfg(feature = "gbm")]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

#[cfg(feature = "gbm")]
impl TreeBuilder<'_> {
    /// Grows the subtree over `members` and returns its node index.
    fn grow(&mut self, members: &[usize], depth: usize) -> usize {
        let (g, h) = self.sums(members);
        let at = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: -g / (h + self.params.lambda),
        });

        if members.is_empty()
            || depth >= self.params.max_depth
            || members.len() < 2 * self.params.min_samples_leaf
        {
            return at;
        }
        let Some(best) = self.best_split(members, g, h) else {
            return at;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = members
            .iter()
            .copied()
            .partition(|&i| self.rows[i][best.feature] <= best.threshold);

        let left = self.grow(&left_rows, depth + 1);
        let right = self.grow(&right_rows, depth + 1);
        self.nodes[at] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        at
    }

    fn sums(&self, members: &[usize]) -> (f64, f64) {
        members
            .iter()
            .fold((0.0, 0.0), |(g, h), &i| (g + self.grad[i], h + self.hess[i]))
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    fn best_split(&self, members: &[usize], g_total: f64, h_total: f64) -> Option<SplitCandidate> {
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent = self.score(g_total, h_total);
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..self.rows[members[0]].len() {
            let mut present: Vec<(f64, usize)> = members
                .iter()
                .map(|&i| (self.rows[i][feature], i))
                .filter(|(x, _)| !x.is_nan())
                .collect();
            present.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (mut gl, mut hl) = (0.0, 0.0);
            for k in 0..present.len().saturating_sub(1) {
                let (x, i) = present[k];
                gl += self.grad[i];
                hl += self.hess[i];

                let next = present[k + 1].0;
                if next <= x {
                    continue;
                }
                let left_count = k + 1;
                let right_count = members.len() - left_count;
                if left_count < min_leaf || right_count < min_leaf {
                    continue;
                }

                let gain = self.score(gl, hl) + self.score(g_total - gl, h_total - hl) - parent;
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: x + (next - x) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}
