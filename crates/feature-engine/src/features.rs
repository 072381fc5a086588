//! Feature Vector Assembly

use crate::encoder::LabelEncoder;
use crate::scaler::StandardScaler;
use crate::FeatureError;
use census_data::{CategoricalColumn, CensusRecord, NumericColumn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Number of features in the vector
pub const FEATURE_DIMENSION: usize = 14;

/// Column order of every feature vector, at training and inference time
pub const FEATURE_ORDER: [&str; FEATURE_DIMENSION] = [
    "age",
    "workclass",
    "fnlwgt",
    "education",
    "educational-num",
    "marital-status",
    "occupation",
    "relationship",
    "race",
    "gender",
    "capital-gain",
    "capital-loss",
    "hours-per-week",
    "native-country",
];

/// One column of the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Numeric(NumericColumn),
    Categorical(CategoricalColumn),
}

impl Feature {
    /// Features in [`FEATURE_ORDER`]
    pub const ORDERED: [Feature; FEATURE_DIMENSION] = [
        Feature::Numeric(NumericColumn::Age),
        Feature::Categorical(CategoricalColumn::Workclass),
        Feature::Numeric(NumericColumn::Fnlwgt),
        Feature::Categorical(CategoricalColumn::Education),
        Feature::Numeric(NumericColumn::EducationalNum),
        Feature::Categorical(CategoricalColumn::MaritalStatus),
        Feature::Categorical(CategoricalColumn::Occupation),
        Feature::Categorical(CategoricalColumn::Relationship),
        Feature::Categorical(CategoricalColumn::Race),
        Feature::Categorical(CategoricalColumn::Gender),
        Feature::Numeric(NumericColumn::CapitalGain),
        Feature::Numeric(NumericColumn::CapitalLoss),
        Feature::Numeric(NumericColumn::HoursPerWeek),
        Feature::Categorical(CategoricalColumn::NativeCountry),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Numeric(c) => c.name(),
            Feature::Categorical(c) => c.name(),
        }
    }
}

/// Feature vector for ML inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Values in [`FEATURE_ORDER`]
    pub values: Vec<f64>,
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            values: vec![0.0; FEATURE_DIMENSION],
        }
    }
}

impl FeatureVector {
    /// Value of a named feature
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_ORDER
            .iter()
            .position(|f| *f == name)
            .and_then(|i| self.values.get(i).copied())
    }
}

/// Column transform fitted for one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ColumnTransform {
    Scale(StandardScaler),
    Encode(LabelEncoder),
}

/// Fitted encoders and scalers, applied identically at training and inference time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    /// One transform per entry of [`FEATURE_ORDER`]
    transforms: Vec<ColumnTransform>,
}

impl Preprocessor {
    /// Fit per-column encoders and scalers on training records
    pub fn fit(records: &[CensusRecord]) -> Result<Self, FeatureError> {
        if records.is_empty() {
            return Err(FeatureError::EmptyInput);
        }

        let transforms = Feature::ORDERED
            .iter()
            .map(|feature| match feature {
                Feature::Numeric(column) => {
                    let values: Vec<f64> =
                        records.iter().map(|r| r.numeric(*column) as f64).collect();
                    ColumnTransform::Scale(StandardScaler::fit(&values))
                }
                Feature::Categorical(column) => ColumnTransform::Encode(LabelEncoder::fit(
                    records.iter().map(|r| r.categorical(*column)),
                )),
            })
            .collect();

        info!("Fitted preprocessor on {} records", records.len());
        Ok(Self { transforms })
    }

    /// Convert one record into a feature vector
    pub fn transform(&self, record: &CensusRecord) -> FeatureVector {
        let values = Feature::ORDERED
            .iter()
            .zip(&self.transforms)
            .map(|(feature, transform)| match (feature, transform) {
                (Feature::Numeric(c), ColumnTransform::Scale(s)) => {
                    s.transform(record.numeric(*c) as f64)
                }
                (Feature::Categorical(c), ColumnTransform::Encode(e)) => {
                    e.encode(record.categorical(*c))
                }
                // Unreachable for preprocessors built by `fit`
                _ => 0.0,
            })
            .collect();
        FeatureVector { values }
    }

    /// Convert many records into a row-major feature matrix
    pub fn transform_batch(&self, records: &[CensusRecord]) -> Array2<f64> {
        let mut matrix = Array2::zeros((records.len(), FEATURE_DIMENSION));
        for (i, record) in records.iter().enumerate() {
            let features = self.transform(record);
            for (j, v) in features.values.into_iter().enumerate() {
                matrix[[i, j]] = v;
            }
        }
        debug!("Transformed batch of {} records", records.len());
        matrix
    }

    /// Check that a deserialized preprocessor matches the current feature layout
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.transforms.len() != FEATURE_DIMENSION {
            return Err(FeatureError::LayoutMismatch(format!(
                "expected {} columns, found {}",
                FEATURE_DIMENSION,
                self.transforms.len()
            )));
        }
        for (feature, transform) in Feature::ORDERED.iter().zip(&self.transforms) {
            let matches = matches!(
                (feature, transform),
                (Feature::Numeric(_), ColumnTransform::Scale(_))
                    | (Feature::Categorical(_), ColumnTransform::Encode(_))
            );
            if !matches {
                return Err(FeatureError::LayoutMismatch(format!(
                    "column '{}' has the wrong transform kind",
                    feature.name()
                )));
            }
        }
        Ok(())
    }

    /// Encoder fitted for a categorical column
    pub fn encoder(&self, column: CategoricalColumn) -> Option<&LabelEncoder> {
        self.position(Feature::Categorical(column))
            .and_then(|i| match &self.transforms[i] {
                ColumnTransform::Encode(e) => Some(e),
                ColumnTransform::Scale(_) => None,
            })
    }

    /// Scaler fitted for a numeric column
    pub fn scaler(&self, column: NumericColumn) -> Option<&StandardScaler> {
        self.position(Feature::Numeric(column))
            .and_then(|i| match &self.transforms[i] {
                ColumnTransform::Scale(s) => Some(s),
                ColumnTransform::Encode(_) => None,
            })
    }

    fn position(&self, feature: Feature) -> Option<usize> {
        Feature::ORDERED
            .iter()
            .position(|f| *f == feature)
            .filter(|i| *i < self.transforms.len())
    }
}
