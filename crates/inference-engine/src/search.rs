//! Cross-Validated Grid Search

use crate::forest::{ForestParams, RandomForest};
use crate::metrics::accuracy;
use crate::InferenceError;
use census_data::Income;
use ndarray::{ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Candidate values for each forest hyperparameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200],
            max_depth: vec![None, Some(10), Some(20)],
            min_samples_split: vec![2, 5],
            min_samples_leaf: vec![1, 2],
        }
    }
}

impl ParamGrid {
    /// Reduced grid for quick experiments
    pub fn quick() -> Self {
        Self {
            n_estimators: vec![30],
            max_depth: vec![Some(10), None],
            min_samples_split: vec![2],
            min_samples_leaf: vec![1, 2],
        }
    }

    /// Every combination; parameter names iterate alphabetically with the last varying fastest
    pub fn candidates(&self) -> Vec<ForestParams> {
        let mut out = Vec::new();
        for &max_depth in &self.max_depth {
            for &min_samples_leaf in &self.min_samples_leaf {
                for &min_samples_split in &self.min_samples_split {
                    for &n_estimators in &self.n_estimators {
                        out.push(ForestParams {
                            n_estimators,
                            max_depth,
                            min_samples_split,
                            min_samples_leaf,
                        });
                    }
                }
            }
        }
        out
    }
}

/// Cross-validation scores of one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvResult {
    pub params: ForestParams,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
}

/// Outcome of a grid search: scores plus the refit best model
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_params: ForestParams,
    pub best_score: f64,
    pub results: Vec<CvResult>,
    pub model: RandomForest,
}

/// Exhaustive search over a [`ParamGrid`] with stratified k-fold CV
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    folds: usize,
    seed: u64,
}

impl GridSearch {
    pub fn new(grid: ParamGrid, folds: usize, seed: u64) -> Self {
        Self { grid, folds, seed }
    }

    /// Score every candidate, then refit the best one on all of `x`
    pub fn fit(&self, x: ArrayView2<f64>, labels: &[usize]) -> Result<SearchOutcome, InferenceError> {
        let candidates = self.grid.candidates();
        if candidates.is_empty() {
            return Err(InferenceError::InvalidTrainingData(
                "parameter grid is empty".to_string(),
            ));
        }
        let folds = stratified_folds(labels, self.folds)?;

        info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits",
            folds.len(),
            candidates.len(),
            folds.len() * candidates.len()
        );

        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(c, f)| self.score_fold(x, labels, &folds, f, candidates[c]))
            .collect::<Result<_, _>>()?;

        let results: Vec<CvResult> = candidates
            .iter()
            .enumerate()
            .map(|(c, params)| {
                let fold_scores = scores[c * folds.len()..(c + 1) * folds.len()].to_vec();
                let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
                debug!("CV {} -> {:.4}", params, mean_score);
                CvResult {
                    params: *params,
                    fold_scores,
                    mean_score,
                }
            })
            .collect();

        // Strictly greater keeps the earliest candidate on ties
        let mut best = &results[0];
        for result in &results[1..] {
            if result.mean_score > best.mean_score {
                best = result;
            }
        }
        let best_params = best.params;
        let best_score = best.mean_score;
        info!("Best parameters: {} (CV accuracy {:.4})", best_params, best_score);

        let model = RandomForest::fit(x, labels, best_params, self.seed)?;

        Ok(SearchOutcome {
            best_params,
            best_score,
            results,
            model,
        })
    }

    fn score_fold(
        &self,
        x: ArrayView2<f64>,
        labels: &[usize],
        folds: &[Vec<usize>],
        fold: usize,
        params: ForestParams,
    ) -> Result<f64, InferenceError> {
        let held_out = &folds[fold];
        let train: Vec<usize> = folds
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != fold)
            .flat_map(|(_, idx)| idx.iter().copied())
            .collect();

        let x_train = x.select(Axis(0), &train);
        let y_train: Vec<usize> = train.iter().map(|&i| labels[i]).collect();
        let forest = RandomForest::fit(x_train.view(), &y_train, params, self.seed)?;

        let x_test = x.select(Axis(0), held_out);
        let predicted = forest.predict_batch(x_test.view())?;
        let truth: Vec<Income> = held_out
            .iter()
            .map(|&i| Income::from_class_index(labels[i]))
            .collect();
        Ok(accuracy(&truth, &predicted))
    }
}

/// Split sample indices into `k` folds, dealing each class round-robin so
/// every fold keeps the overall class balance
pub fn stratified_folds(labels: &[usize], k: usize) -> Result<Vec<Vec<usize>>, InferenceError> {
    if k < 2 {
        return Err(InferenceError::InvalidTrainingData(format!(
            "cross-validation needs at least 2 folds, got {}",
            k
        )));
    }
    if labels.len() < k {
        return Err(InferenceError::InvalidTrainingData(format!(
            "cannot split {} samples into {} folds",
            labels.len(),
            k
        )));
    }

    let mut folds = vec![Vec::with_capacity(labels.len() / k + 1); k];
    let mut next = [0usize; 2];
    for (i, &label) in labels.iter().enumerate() {
        let class = label.min(1);
        folds[next[class] % k].push(i);
        next[class] += 1;
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }

    if folds.iter().any(Vec::is_empty) {
        return Err(InferenceError::InvalidTrainingData(
            "a cross-validation fold is empty".to_string(),
        ));
    }
    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_default_grid_size() {
        let candidates = ParamGrid::default().candidates();
        assert_eq!(candidates.len(), 24);
        assert_eq!(
            candidates[0],
            ForestParams {
                n_estimators: 100,
                max_depth: None,
                min_samples_split: 2,
                min_samples_leaf: 1,
            }
        );
        assert_eq!(candidates[1].n_estimators, 200);
        assert_eq!(candidates[23].max_depth, Some(20));
    }

    #[test]
    fn test_stratified_folds_balance() {
        let labels: Vec<usize> = (0..30).map(|i| usize::from(i % 3 == 0)).collect();
        let folds = stratified_folds(&labels, 3).unwrap();
        assert_eq!(folds.len(), 3);

        let mut seen: Vec<usize> = folds.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..30).collect::<Vec<_>>());

        for fold in &folds {
            let positives = fold.iter().filter(|&&i| labels[i] == 1).count();
            assert_eq!(positives, 10 / 3 + usize::from(fold == &folds[0]));
        }
    }

    #[test]
    fn test_too_few_samples() {
        assert!(stratified_folds(&[0, 1], 3).is_err());
        assert!(stratified_folds(&[0, 1, 0], 1).is_err());
    }

    #[test]
    fn test_search_picks_and_refits() {
        let n = 90;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 4) as f64 });
        let y: Vec<usize> = (0..n).map(|i| usize::from(i >= n / 2)).collect();
        let grid = ParamGrid {
            n_estimators: vec![5],
            max_depth: vec![Some(1), None],
            min_samples_split: vec![2],
            min_samples_leaf: vec![1],
        };
        let outcome = GridSearch::new(grid, 3, 42).fit(x.view(), &y).unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results.iter().all(|r| r.fold_scores.len() == 3));
        assert!(outcome.best_score > 0.9);
        assert_eq!(outcome.model.params(), &outcome.best_params);
        assert_eq!(outcome.model.n_features(), 2);
    }
}
