//! Classification Metrics

use census_data::Income;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fraction of predictions equal to the truth
pub fn accuracy(truth: &[Income], predicted: &[Income]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / truth.len() as f64
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics with macro and weighted averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Indexed by class index (`<=50K`, `>50K`)
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    /// Build from truth and predictions of equal length
    pub fn new(truth: &[Income], predicted: &[Income]) -> Self {
        let classes = Income::all().map(|class| {
            let tp = truth
                .iter()
                .zip(predicted)
                .filter(|(t, p)| **t == class && **p == class)
                .count();
            let predicted_count = predicted.iter().filter(|p| **p == class).count();
            let support = truth.iter().filter(|t| **t == class).count();

            let precision = ratio(tp, predicted_count);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                precision,
                recall,
                f1,
                support,
            }
        });

        let total: usize = classes.iter().map(|c| c.support).sum();
        let average = |weight: &dyn Fn(&ClassMetrics) -> f64| {
            let norm: f64 = classes.iter().map(weight).sum();
            let avg = |field: fn(&ClassMetrics) -> f64| {
                if norm == 0.0 {
                    0.0
                } else {
                    classes.iter().map(|c| field(c) * weight(c)).sum::<f64>() / norm
                }
            };
            ClassMetrics {
                precision: avg(|c| c.precision),
                recall: avg(|c| c.recall),
                f1: avg(|c| c.f1),
                support: total,
            }
        };

        Self {
            macro_avg: average(&|_| 1.0),
            weighted_avg: average(&|c| c.support as f64),
            accuracy: accuracy(truth, predicted),
            classes,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (class, m) in Income::all().iter().zip(&self.classes) {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                class.class_index(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Income::{AtMost50K as Lo, Above50K as Hi};

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[Lo, Hi, Hi, Lo], &[Lo, Hi, Lo, Lo]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_report_values() {
        let truth = [Lo, Lo, Lo, Hi, Hi];
        let predicted = [Lo, Lo, Hi, Hi, Lo];
        let report = ClassificationReport::new(&truth, &predicted);

        let lo = report.classes[0];
        assert!((lo.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((lo.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(lo.support, 3);

        let hi = report.classes[1];
        assert!((hi.precision - 0.5).abs() < 1e-12);
        assert!((hi.recall - 0.5).abs() < 1e-12);

        assert!((report.macro_avg.recall - (2.0 / 3.0 + 0.5) / 2.0).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.6).abs() < 1e-12);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert_eq!(report.weighted_avg.support, 5);
    }

    #[test]
    fn test_no_positive_predictions() {
        let report = ClassificationReport::new(&[Lo, Hi], &[Lo, Lo]);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
    }

    #[test]
    fn test_display_has_rows() {
        let text = ClassificationReport::new(&[Lo, Hi], &[Lo, Hi]).to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("macro avg"));
        assert!(text.contains("weighted avg"));
    }
}
