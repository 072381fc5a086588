//! Census Record Types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Binary income class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Income {
    /// `<=50K`
    AtMost50K,
    /// `>50K`
    Above50K,
}

impl Income {
    /// Label as written in the dataset
    pub fn as_str(&self) -> &'static str {
        match self {
            Income::AtMost50K => "<=50K",
            Income::Above50K => ">50K",
        }
    }

    /// Class index used by the classifier (0 or 1)
    pub fn class_index(&self) -> usize {
        match self {
            Income::AtMost50K => 0,
            Income::Above50K => 1,
        }
    }

    /// Inverse of [`Income::class_index`]; anything non-zero is `>50K`
    pub fn from_class_index(index: usize) -> Self {
        if index == 0 {
            Income::AtMost50K
        } else {
            Income::Above50K
        }
    }

    /// Both classes in index order
    pub fn all() -> [Income; 2] {
        [Income::AtMost50K, Income::Above50K]
    }
}

impl fmt::Display for Income {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Income {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The census test split spells its labels with a trailing period
        let label = s.trim();
        let label = label.strip_suffix('.').unwrap_or(label);
        match label {
            "<=50K" => Ok(Income::AtMost50K),
            ">50K" => Ok(Income::Above50K),
            other => Err(other.to_string()),
        }
    }
}

/// One census respondent: the 14 model inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusRecord {
    pub age: i64,
    pub workclass: String,
    pub fnlwgt: i64,
    pub education: String,
    #[serde(rename = "educational-num")]
    pub educational_num: i64,
    #[serde(rename = "marital-status")]
    pub marital_status: String,
    pub occupation: String,
    pub relationship: String,
    pub race: String,
    pub gender: String,
    #[serde(rename = "capital-gain")]
    pub capital_gain: i64,
    #[serde(rename = "capital-loss")]
    pub capital_loss: i64,
    #[serde(rename = "hours-per-week")]
    pub hours_per_week: i64,
    #[serde(rename = "native-country")]
    pub native_country: String,
}

/// Numeric columns of a census record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    Age,
    Fnlwgt,
    EducationalNum,
    CapitalGain,
    CapitalLoss,
    HoursPerWeek,
}

/// Categorical columns of a census record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalColumn {
    Workclass,
    Education,
    MaritalStatus,
    Occupation,
    Relationship,
    Race,
    Gender,
    NativeCountry,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 6] = [
        NumericColumn::Age,
        NumericColumn::Fnlwgt,
        NumericColumn::EducationalNum,
        NumericColumn::CapitalGain,
        NumericColumn::CapitalLoss,
        NumericColumn::HoursPerWeek,
    ];

    /// Column name in the dataset header
    pub fn name(&self) -> &'static str {
        match self {
            NumericColumn::Age => "age",
            NumericColumn::Fnlwgt => "fnlwgt",
            NumericColumn::EducationalNum => "educational-num",
            NumericColumn::CapitalGain => "capital-gain",
            NumericColumn::CapitalLoss => "capital-loss",
            NumericColumn::HoursPerWeek => "hours-per-week",
        }
    }
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 8] = [
        CategoricalColumn::Workclass,
        CategoricalColumn::Education,
        CategoricalColumn::MaritalStatus,
        CategoricalColumn::Occupation,
        CategoricalColumn::Relationship,
        CategoricalColumn::Race,
        CategoricalColumn::Gender,
        CategoricalColumn::NativeCountry,
    ];

    /// Column name in the dataset header
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalColumn::Workclass => "workclass",
            CategoricalColumn::Education => "education",
            CategoricalColumn::MaritalStatus => "marital-status",
            CategoricalColumn::Occupation => "occupation",
            CategoricalColumn::Relationship => "relationship",
            CategoricalColumn::Race => "race",
            CategoricalColumn::Gender => "gender",
            CategoricalColumn::NativeCountry => "native-country",
        }
    }
}

impl CensusRecord {
    /// Value of a numeric column
    pub fn numeric(&self, column: NumericColumn) -> i64 {
        match column {
            NumericColumn::Age => self.age,
            NumericColumn::Fnlwgt => self.fnlwgt,
            NumericColumn::EducationalNum => self.educational_num,
            NumericColumn::CapitalGain => self.capital_gain,
            NumericColumn::CapitalLoss => self.capital_loss,
            NumericColumn::HoursPerWeek => self.hours_per_week,
        }
    }

    /// Value of a categorical column
    pub fn categorical(&self, column: CategoricalColumn) -> &str {
        match column {
            CategoricalColumn::Workclass => &self.workclass,
            CategoricalColumn::Education => &self.education,
            CategoricalColumn::MaritalStatus => &self.marital_status,
            CategoricalColumn::Occupation => &self.occupation,
            CategoricalColumn::Relationship => &self.relationship,
            CategoricalColumn::Race => &self.race,
            CategoricalColumn::Gender => &self.gender,
            CategoricalColumn::NativeCountry => &self.native_country,
        }
    }

    /// Young, basic-education service worker used to sanity check a trained model
    pub fn young_service_profile() -> Self {
        Self {
            age: 23,
            workclass: "Private".to_string(),
            fnlwgt: 200_000,
            education: "HS-grad".to_string(),
            educational_num: 9,
            marital_status: "Never-married".to_string(),
            occupation: "Other-service".to_string(),
            relationship: "Not-in-family".to_string(),
            race: "White".to_string(),
            gender: "Female".to_string(),
            capital_gain: 0,
            capital_loss: 240,
            hours_per_week: 35,
            native_country: "Mexico".to_string(),
        }
    }

    /// Highly educated executive used to sanity check a trained model
    pub fn executive_profile() -> Self {
        Self {
            age: 45,
            workclass: "Exec-managerial".to_string(),
            fnlwgt: 200_000,
            education: "Masters".to_string(),
            educational_num: 14,
            marital_status: "Married-civ-spouse".to_string(),
            occupation: "Exec-managerial".to_string(),
            relationship: "Husband".to_string(),
            race: "White".to_string(),
            gender: "Male".to_string(),
            capital_gain: 3000,
            capital_loss: 0,
            hours_per_week: 50,
            native_country: "United-States".to_string(),
        }
    }
}

/// Education level to its ordinal number; unknown levels map to 0
pub fn education_number(education: &str) -> i64 {
    match education {
        "Preschool" => 1,
        "1st-4th" => 2,
        "5th-6th" => 3,
        "7th-8th" => 4,
        "9th" => 5,
        "10th" => 6,
        "11th" => 7,
        "12th" => 8,
        "HS-grad" => 9,
        "Some-college" => 10,
        "Assoc-voc" => 11,
        "Assoc-acdm" => 12,
        "Bachelors" => 13,
        "Masters" => 14,
        "Prof-school" => 15,
        "Doctorate" => 16,
        _ => 0,
    }
}

/// Labelled census records
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<CensusRecord>,
    incomes: Vec<Income>,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one labelled record
    pub fn push(&mut self, record: CensusRecord, income: Income) {
        self.records.push(record);
        self.incomes.push(income);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CensusRecord] {
        &self.records
    }

    pub fn incomes(&self) -> &[Income] {
        &self.incomes
    }

    /// Iterate over (record, income) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&CensusRecord, Income)> {
        self.records.iter().zip(self.incomes.iter().copied())
    }

    /// New dataset holding the rows at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Dataset {
        let mut out = Dataset {
            records: Vec::with_capacity(indices.len()),
            incomes: Vec::with_capacity(indices.len()),
        };
        for &i in indices {
            out.push(self.records[i].clone(), self.incomes[i]);
        }
        out
    }
}

impl FromIterator<(CensusRecord, Income)> for Dataset {
    fn from_iter<T: IntoIterator<Item = (CensusRecord, Income)>>(iter: T) -> Self {
        let mut dataset = Dataset::new();
        for (record, income) in iter {
            dataset.push(record, income);
        }
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_income_parsing() {
        assert_eq!(">50K".parse::<Income>(), Ok(Income::Above50K));
        assert_eq!(" <=50K".parse::<Income>(), Ok(Income::AtMost50K));
        assert_eq!(">50K.".parse::<Income>(), Ok(Income::Above50K));
        assert!("50K".parse::<Income>().is_err());
    }

    #[test]
    fn test_class_index() {
        for income in Income::all() {
            assert_eq!(Income::from_class_index(income.class_index()), income);
        }
    }

    #[test]
    fn test_education_number() {
        assert_eq!(education_number("Preschool"), 1);
        assert_eq!(education_number("HS-grad"), 9);
        assert_eq!(education_number("Doctorate"), 16);
        assert_eq!(education_number("Unknown"), 0);
    }

    #[test]
    fn test_record_serde_uses_dataset_names() {
        let record = CensusRecord::executive_profile();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["hours-per-week"], 50);
        assert_eq!(json["native-country"], "United-States");
    }

    #[test]
    fn test_dataset_select() {
        let dataset: Dataset = vec![
            (CensusRecord::young_service_profile(), Income::AtMost50K),
            (CensusRecord::executive_profile(), Income::Above50K),
        ]
        .into_iter()
        .collect();

        let picked = dataset.select(&[1]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked.incomes(), &[Income::Above50K]);
        assert_eq!(picked.records()[0].age, 45);
    }
}
