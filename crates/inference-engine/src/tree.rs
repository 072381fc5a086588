//! CART Decision Tree

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth; `None` grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs to be split
    pub min_samples_split: usize,
    /// Minimum samples each child must keep
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` means `sqrt(n_features)`
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Fraction of positive samples reaching this leaf
        positive_rate: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Binary classification tree stored as a flat node arena (root at 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Sum of child impurities weighted by child sizes
    weighted_impurity: f64,
    left_count: usize,
}

struct PendingNode {
    id: usize,
    samples: Vec<usize>,
    depth: usize,
}

/// Gini impurity of a two-class node
fn gini(count: usize, positives: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let p = positives as f64 / count as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed)
    ///
    /// `labels` holds class indices (0 or 1) for every row of `x`. Returns the
    /// tree and its unnormalized impurity decrease per feature.
    pub fn fit(
        x: ArrayView2<f64>,
        labels: &[usize],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> (Self, Vec<f64>) {
        let n_features = x.ncols();
        let max_features = params
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
            .clamp(1, n_features.max(1));
        let min_leaf = params.min_samples_leaf.max(1);
        let min_split = params.min_samples_split.max(2);

        let mut importances = vec![0.0; n_features];
        let mut nodes = vec![Node::Leaf {
            positive_rate: 0.0,
            samples: 0,
        }];
        let mut stack = vec![PendingNode {
            id: 0,
            samples,
            depth: 0,
        }];
        let mut feature_order: Vec<usize> = (0..n_features).collect();

        while let Some(PendingNode { id, samples, depth }) = stack.pop() {
            let count = samples.len();
            let positives = samples.iter().filter(|&&i| labels[i] == 1).count();
            let leaf = Node::Leaf {
                positive_rate: if count == 0 {
                    0.0
                } else {
                    positives as f64 / count as f64
                },
                samples: count,
            };

            let depth_reached = params.max_depth.is_some_and(|d| depth >= d);
            let pure = positives == 0 || positives == count;
            if depth_reached || pure || count < min_split || count < 2 * min_leaf {
                nodes[id] = leaf;
                continue;
            }

            feature_order.shuffle(rng);
            let Some(split) =
                best_split(x, labels, &samples, &feature_order, max_features, min_leaf)
            else {
                nodes[id] = leaf;
                continue;
            };

            let node_impurity = gini(count, positives);
            importances[split.feature] += count as f64 * node_impurity - split.weighted_impurity;

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&i| x[[i, split.feature]] <= split.threshold);
            debug_assert_eq!(left_samples.len(), split.left_count);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(leaf.clone());
            nodes.push(leaf);
            nodes[id] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            stack.push(PendingNode {
                id: right,
                samples: right_samples,
                depth: depth + 1,
            });
            stack.push(PendingNode {
                id: left,
                samples: left_samples,
                depth: depth + 1,
            });
        }

        (Self { nodes, n_features }, importances)
    }

    /// Probability of the positive class for one feature row
    pub fn predict_proba(&self, row: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { positive_rate, .. } => return *positive_rate,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of nodes, splits and leaves together
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[id] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }

    /// Training samples summed over all leaves (bootstrap draws included)
    pub fn leaf_samples(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| match node {
                Node::Leaf { samples, .. } => *samples,
                Node::Split { .. } => 0,
            })
            .sum()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Structural sanity check for deserialized trees
    pub(crate) fn is_well_formed(&self) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(id, node)| match node {
                Node::Leaf { positive_rate, .. } => (0.0..=1.0).contains(positive_rate),
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    *feature < self.n_features
                        && *left > id
                        && *right > id
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            })
    }
}

/// Search the shuffled features for the split with the lowest weighted Gini
///
/// At least `max_features` non-constant features are examined; the search
/// continues past that only while no valid split has been found.
fn best_split(
    x: ArrayView2<f64>,
    labels: &[usize],
    samples: &[usize],
    feature_order: &[usize],
    max_features: usize,
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let count = samples.len();
    let total_positives = samples.iter().filter(|&&i| labels[i] == 1).count();

    let mut best: Option<SplitCandidate> = None;
    let mut examined = 0;
    let mut column: Vec<(f64, usize)> = Vec::with_capacity(count);

    for &feature in feature_order {
        if examined >= max_features && best.is_some() {
            break;
        }

        column.clear();
        column.extend(samples.iter().map(|&i| (x[[i, feature]], labels[i])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        if column[0].0 == column[count - 1].0 {
            continue;
        }
        examined += 1;

        let mut left_count = 0;
        let mut left_positives = 0;
        for i in 0..count - 1 {
            left_count += 1;
            left_positives += column[i].1;

            let (value, next) = (column[i].0, column[i + 1].0);
            if value == next {
                continue;
            }
            let right_count = count - left_count;
            if left_count < min_leaf || right_count < min_leaf {
                continue;
            }

            let weighted = left_count as f64 * gini(left_count, left_positives)
                + right_count as f64 * gini(right_count, total_positives - left_positives);

            if best.map_or(true, |b| weighted < b.weighted_impurity) {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    weighted_impurity: weighted,
                    left_count,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::SeedableRng;

    fn all_features() -> TreeParams {
        TreeParams {
            max_features: Some(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(10, 0), 0.0);
        assert_eq!(gini(10, 10), 0.0);
        assert!((gini(10, 5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_separable_data() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [10.0, 0.0], [11.0, 0.0], [12.0, 0.0]];
        let y = vec![0, 0, 0, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(7);
        let (tree, importances) =
            DecisionTree::fit(x.view(), &y, (0..6).collect(), &all_features(), &mut rng);

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_samples(), 6);
        assert_eq!(tree.predict_proba(array![2.5, 0.0].view()), 0.0);
        assert_eq!(tree.predict_proba(array![11.0, 0.0].view()), 1.0);
        // Constant feature never splits
        assert_eq!(importances[1], 0.0);
        assert!((importances[0] - 3.0).abs() < 1e-12);
        // Threshold sits between 3 and 10
        assert_eq!(tree.predict_proba(array![6.4, 0.0].view()), 0.0);
        assert_eq!(tree.predict_proba(array![6.6, 0.0].view()), 1.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = Array2::from_shape_fn((32, 1), |(i, _)| i as f64);
        let y: Vec<usize> = (0..32).map(|i| i % 2).collect();
        let params = TreeParams {
            max_depth: Some(3),
            max_features: Some(1),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let (tree, _) = DecisionTree::fit(x.view(), &y, (0..32).collect(), &params, &mut rng);
        assert!(tree.depth() <= 3);
        assert!(tree.is_well_formed());
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = vec![1, 0, 0, 0];
        let params = TreeParams {
            min_samples_leaf: 2,
            max_features: Some(1),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let (tree, _) = DecisionTree::fit(x.view(), &y, (0..4).collect(), &params, &mut rng);
        // The isolating split at 1.5 would leave a single-sample leaf
        assert_eq!(tree.predict_proba(array![1.0].view()), 0.5);
    }

    #[test]
    fn test_min_samples_split_makes_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = vec![0, 1, 1];
        let params = TreeParams {
            min_samples_split: 5,
            max_features: Some(1),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let (tree, _) = DecisionTree::fit(x.view(), &y, (0..3).collect(), &params, &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert!((tree.predict_proba(array![1.0].view()) - 2.0 / 3.0).abs() < 1e-12);
    }
}
