//! Numeric Standard Scaling

use crate::statistics::ColumnStats;
use serde::{Deserialize, Serialize};

/// Z-score scaler fitted on population mean and standard deviation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: f64,
    scale: f64,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self {
            mean: 0.0,
            scale: 1.0,
        }
    }
}

impl StandardScaler {
    /// Fit on the observed values
    pub fn fit(values: &[f64]) -> Self {
        let stats = ColumnStats::compute(values);
        // Constant columns pass through centered but unscaled
        let scale = if stats.std_dev > 0.0 { stats.std_dev } else { 1.0 };
        Self {
            mean: stats.mean,
            scale,
        }
    }

    /// Scale one value
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }

    /// Undo [`StandardScaler::transform`]
    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.scale + self.mean
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}
