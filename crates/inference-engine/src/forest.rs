//! Random Forest Classifier

use crate::tree::{DecisionTree, TreeParams};
use crate::InferenceError;
use census_data::Income;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Hyperparameters searched by the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl ForestParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: None,
        }
    }
}

impl fmt::Display for ForestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self
            .max_depth
            .map_or_else(|| "None".to_string(), |d| d.to_string());
        write!(
            f,
            "{{max_depth: {}, min_samples_leaf: {}, min_samples_split: {}, n_estimators: {}}}",
            depth, self.min_samples_leaf, self.min_samples_split, self.n_estimators
        )
    }
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
    n_features: usize,
}

impl RandomForest {
    /// Fit on a feature matrix and class-index labels (0 = `<=50K`, 1 = `>50K`)
    pub fn fit(
        x: ArrayView2<f64>,
        labels: &[usize],
        params: ForestParams,
        seed: u64,
    ) -> Result<Self, InferenceError> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(InferenceError::InvalidTrainingData(
                "no training samples".to_string(),
            ));
        }
        if labels.len() != n_samples {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{} labels", n_samples),
                actual: format!("{} labels", labels.len()),
            });
        }
        if params.n_estimators == 0 {
            return Err(InferenceError::InvalidTrainingData(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        // Per-tree seeds drawn up front keep parallel fitting deterministic
        let mut rng = StdRng::seed_from_u64(seed);
        let tree_seeds: Vec<u64> = (0..params.n_estimators).map(|_| rng.gen()).collect();
        let tree_params = params.tree_params();

        let fitted: Vec<(DecisionTree, Vec<f64>)> = tree_seeds
            .par_iter()
            .map(|&tree_seed| {
                let mut rng = StdRng::seed_from_u64(tree_seed);
                let bootstrap: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                DecisionTree::fit(x, labels, bootstrap, &tree_params, &mut rng)
            })
            .collect();

        let n_features = x.ncols();
        let mut feature_importances = vec![0.0; n_features];
        let mut contributing = 0usize;
        let mut trees = Vec::with_capacity(fitted.len());
        for (tree, importances) in fitted {
            let total: f64 = importances.iter().sum();
            // Single-leaf trees carry no importance
            if total > 0.0 {
                for (acc, v) in feature_importances.iter_mut().zip(&importances) {
                    *acc += v / total;
                }
                contributing += 1;
            }
            trees.push(tree);
        }
        if contributing > 0 {
            for v in &mut feature_importances {
                *v /= contributing as f64;
            }
        }

        debug!(
            "Fitted forest {} on {} samples ({} nodes)",
            params,
            n_samples,
            trees.iter().map(DecisionTree::node_count).sum::<usize>()
        );

        Ok(Self {
            params,
            trees,
            feature_importances,
            n_features,
        })
    }

    /// Probability of `>50K` for one feature row (mean of the trees' leaf rates)
    pub fn predict_proba(&self, row: ArrayView1<f64>) -> Result<f64, InferenceError> {
        if row.len() != self.n_features {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", row.len()),
            });
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    /// Predicted class for one feature row; ties go to `<=50K`
    pub fn predict(&self, row: ArrayView1<f64>) -> Result<Income, InferenceError> {
        let p = self.predict_proba(row)?;
        Ok(if p > 0.5 {
            Income::Above50K
        } else {
            Income::AtMost50K
        })
    }

    /// Predicted classes for every row of a matrix
    pub fn predict_batch(&self, x: ArrayView2<f64>) -> Result<Vec<Income>, InferenceError> {
        x.outer_iter()
            .into_par_iter()
            .map(|row| self.predict(row))
            .collect()
    }

    /// Mean normalized impurity decrease per feature (sums to 1 unless every tree is a leaf)
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Structural check used after deserialization
    pub(crate) fn is_well_formed(&self) -> bool {
        !self.trees.is_empty()
            && self.feature_importances.len() == self.n_features
            && self
                .trees
                .iter()
                .all(|t| t.n_features() == self.n_features && t.is_well_formed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use proptest::prelude::*;

    /// Label is 1 when the first feature exceeds 0.5; second feature is noise
    fn threshold_data(n: usize) -> (Array2<f64>, Vec<usize>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                i as f64 / n as f64
            } else {
                ((i * 7919) % 13) as f64
            }
        });
        let y = (0..n).map(|i| usize::from(i as f64 / n as f64 > 0.5)).collect();
        (x, y)
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_estimators: 15,
            ..Default::default()
        }
    }

    #[test]
    fn test_learns_threshold() {
        let (x, y) = threshold_data(200);
        let forest = RandomForest::fit(x.view(), &y, small_params(), 42).unwrap();
        assert_eq!(forest.n_trees(), 15);
        assert_eq!(forest.predict(array![0.1, 3.0].view()).unwrap(), Income::AtMost50K);
        assert_eq!(forest.predict(array![0.9, 3.0].view()).unwrap(), Income::Above50K);

        let importances = forest.feature_importances();
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = threshold_data(120);
        let a = RandomForest::fit(x.view(), &y, small_params(), 5).unwrap();
        let b = RandomForest::fit(x.view(), &y, small_params(), 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrong_width_rejected() {
        let (x, y) = threshold_data(50);
        let forest = RandomForest::fit(x.view(), &y, small_params(), 1).unwrap();
        assert!(matches!(
            forest.predict(array![0.1].view()),
            Err(InferenceError::InvalidInputShape { .. })
        ));
    }

    #[test]
    fn test_label_count_mismatch() {
        let (x, _) = threshold_data(10);
        assert!(RandomForest::fit(x.view(), &[0, 1], small_params(), 1).is_err());
    }

    #[test]
    fn test_batch_matches_rows() {
        let (x, y) = threshold_data(80);
        let forest = RandomForest::fit(x.view(), &y, small_params(), 9).unwrap();
        let batch = forest.predict_batch(x.view()).unwrap();
        for (i, row) in x.outer_iter().enumerate() {
            assert_eq!(batch[i], forest.predict(row).unwrap());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]
        #[test]
        fn prop_probabilities_in_unit_interval(a in -5.0f64..5.0, b in -5.0f64..5.0) {
            let (x, y) = threshold_data(60);
            let forest = RandomForest::fit(x.view(), &y, small_params(), 3).unwrap();
            let p = forest.predict_proba(array![a, b].view()).unwrap();
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
