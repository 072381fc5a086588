//! Demographic Rules

use census_data::{CensusRecord, Income};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Education levels treated as "basic" by the young-worker rules
const BASIC_EDUCATION: [&str; 6] = ["HS-grad", "Some-college", "11th", "12th", "10th", "9th"];
/// Occupations covered by the fallback young-worker rule
const FALLBACK_SERVICE_OCCUPATIONS: [&str; 4] = [
    "Other-service",
    "Adm-clerical",
    "Handlers-cleaners",
    "Farming-fishing",
];
/// Occupations covered by the model override
const OVERRIDE_SERVICE_OCCUPATIONS: [&str; 3] =
    ["Other-service", "Handlers-cleaners", "Adm-clerical"];
const EXECUTIVE_EDUCATION: [&str; 3] = ["Bachelors", "Masters", "Doctorate"];
const EXECUTIVE_OCCUPATIONS: [&str; 2] = ["Exec-managerial", "Prof-specialty"];
const HIGHER_EDUCATION: [&str; 4] = ["Bachelors", "Masters", "Doctorate", "Prof-school"];

/// Note attached to every fallback response
pub const FALLBACK_NOTE: &str =
    "This is a simulated prediction based on demographic rules since the model file is missing";
/// Note attached when the young-worker override fires
pub const OVERRIDE_NOTE: &str =
    "Prediction adjusted based on demographic rules (young worker profile)";

/// Fallback rules in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Young worker with basic education in a service job, part time
    YoungBasicWorker,
    /// Under 25 without meaningful capital gains
    YoungNoCapitalGain,
    /// Over 35, degree, executive or professional job, long hours
    ExecutiveHigherEducation,
    /// Capital gains above 5000
    HighCapitalGain,
    /// Male, 35 or older, degree or professional school
    OlderEducatedMale,
    /// Nothing else matched
    DefaultDemographic,
}

impl Rule {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::YoungBasicWorker => "young_basic_worker",
            Rule::YoungNoCapitalGain => "young_no_capital_gain",
            Rule::ExecutiveHigherEducation => "executive_higher_education",
            Rule::HighCapitalGain => "high_capital_gain",
            Rule::OlderEducatedMale => "older_educated_male",
            Rule::DefaultDemographic => "default_demographic",
        }
    }

    /// Human readable description
    pub fn description(&self) -> &'static str {
        match self {
            Rule::YoungBasicWorker => "Young worker with basic education",
            Rule::YoungNoCapitalGain => "Young worker with no capital gain",
            Rule::ExecutiveHigherEducation => "Executive with higher education",
            Rule::HighCapitalGain => "High capital gain",
            Rule::OlderEducatedMale => "Older male with higher education",
            Rule::DefaultDemographic => "Default demographic",
        }
    }

    /// Income class the rule predicts
    pub fn income(&self) -> Income {
        match self {
            Rule::YoungBasicWorker | Rule::YoungNoCapitalGain | Rule::DefaultDemographic => {
                Income::AtMost50K
            }
            Rule::ExecutiveHigherEducation | Rule::HighCapitalGain | Rule::OlderEducatedMale => {
                Income::Above50K
            }
        }
    }

    fn matches(&self, r: &CensusRecord) -> bool {
        match self {
            Rule::YoungBasicWorker => {
                r.age < 30
                    && BASIC_EDUCATION.contains(&r.education.as_str())
                    && FALLBACK_SERVICE_OCCUPATIONS.contains(&r.occupation.as_str())
                    && r.hours_per_week < 40
            }
            Rule::YoungNoCapitalGain => r.age < 25 && r.capital_gain < 1000,
            Rule::ExecutiveHigherEducation => {
                r.age > 35
                    && EXECUTIVE_EDUCATION.contains(&r.education.as_str())
                    && EXECUTIVE_OCCUPATIONS.contains(&r.occupation.as_str())
                    && r.hours_per_week >= 45
            }
            Rule::HighCapitalGain => r.capital_gain > 5000,
            Rule::OlderEducatedMale => {
                r.gender == "Male"
                    && r.age >= 35
                    && HIGHER_EDUCATION.contains(&r.education.as_str())
            }
            Rule::DefaultDemographic => true,
        }
    }

    const ORDERED: [Rule; 6] = [
        Rule::YoungBasicWorker,
        Rule::YoungNoCapitalGain,
        Rule::ExecutiveHigherEducation,
        Rule::HighCapitalGain,
        Rule::OlderEducatedMale,
        Rule::DefaultDemographic,
    ];
}

/// Result of the rule-based predictor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub income: Income,
    pub rule: Rule,
}

/// Correction applied on top of a model prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    /// Income class after the override
    pub income: Income,
    /// Whether the model's answer actually changed
    pub changed: bool,
    pub note: &'static str,
}

/// Rule-based predictor and model override
#[derive(Debug, Clone, Default)]
pub struct FallbackEngine;

impl FallbackEngine {
    pub fn new() -> Self {
        Self
    }

    /// Predict from demographic rules alone; the first matching rule wins
    pub fn predict(&self, record: &CensusRecord) -> RuleVerdict {
        let rule = Rule::ORDERED
            .into_iter()
            .find(|rule| rule.matches(record))
            .unwrap_or(Rule::DefaultDemographic);
        info!("Rule applied: {}", rule.description());
        RuleVerdict {
            income: rule.income(),
            rule,
        }
    }

    /// Force young basic-education service workers to `<=50K`
    ///
    /// Returns `Some` whenever the profile matches, even if the model
    /// already predicted `<=50K`.
    pub fn override_prediction(&self, record: &CensusRecord, model: Income) -> Option<Override> {
        let matches = record.age < 30
            && BASIC_EDUCATION.contains(&record.education.as_str())
            && OVERRIDE_SERVICE_OCCUPATIONS.contains(&record.occupation.as_str())
            && record.hours_per_week < 40
            && record.capital_gain < 1000;
        if !matches {
            return None;
        }

        let changed = model != Income::AtMost50K;
        debug!("Young worker override matched (model said {}, changed: {})", model, changed);
        Some(Override {
            income: Income::AtMost50K,
            changed,
            note: OVERRIDE_NOTE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn base() -> CensusRecord {
        CensusRecord {
            age: 40,
            workclass: "Private".to_string(),
            fnlwgt: 100_000,
            education: "Assoc-voc".to_string(),
            educational_num: 11,
            marital_status: "Divorced".to_string(),
            occupation: "Craft-repair".to_string(),
            relationship: "Unmarried".to_string(),
            race: "White".to_string(),
            gender: "Female".to_string(),
            capital_gain: 0,
            capital_loss: 0,
            hours_per_week: 40,
            native_country: "United-States".to_string(),
        }
    }

    #[test]
    fn test_young_basic_worker() {
        let verdict = FallbackEngine::new().predict(&CensusRecord::young_service_profile());
        assert_eq!(verdict.rule, Rule::YoungBasicWorker);
        assert_eq!(verdict.income, Income::AtMost50K);
    }

    #[test]
    fn test_farming_counts_for_fallback_only() {
        let mut r = CensusRecord::young_service_profile();
        r.occupation = "Farming-fishing".to_string();
        let engine = FallbackEngine::new();
        assert_eq!(engine.predict(&r).rule, Rule::YoungBasicWorker);
        assert_eq!(engine.override_prediction(&r, Income::Above50K), None);
    }

    #[test]
    fn test_young_no_capital_gain() {
        let mut r = base();
        r.age = 22;
        r.capital_gain = 999;
        assert_eq!(FallbackEngine::new().predict(&r).rule, Rule::YoungNoCapitalGain);
    }

    #[test]
    fn test_executive() {
        let verdict = FallbackEngine::new().predict(&CensusRecord::executive_profile());
        assert_eq!(verdict.rule, Rule::ExecutiveHigherEducation);
        assert_eq!(verdict.income, Income::Above50K);
    }

    #[test]
    fn test_high_capital_gain() {
        let mut r = base();
        r.capital_gain = 5001;
        assert_eq!(FallbackEngine::new().predict(&r).rule, Rule::HighCapitalGain);
        r.capital_gain = 5000;
        assert_eq!(FallbackEngine::new().predict(&r).rule, Rule::DefaultDemographic);
    }

    #[test]
    fn test_older_educated_male() {
        let mut r = base();
        r.gender = "Male".to_string();
        r.age = 35;
        r.education = "Prof-school".to_string();
        let verdict = FallbackEngine::new().predict(&r);
        assert_eq!(verdict.rule, Rule::OlderEducatedMale);
        assert_eq!(verdict.income, Income::Above50K);
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // Young with big gains: the young rule comes first
        let mut r = base();
        r.age = 20;
        r.capital_gain = 500;
        assert_eq!(FallbackEngine::new().predict(&r).rule, Rule::YoungNoCapitalGain);
        r.capital_gain = 10_000;
        assert_eq!(FallbackEngine::new().predict(&r).rule, Rule::HighCapitalGain);
    }

    #[test]
    fn test_override_reports_even_when_unchanged() {
        let engine = FallbackEngine::new();
        let r = CensusRecord::young_service_profile();
        let unchanged = engine.override_prediction(&r, Income::AtMost50K).unwrap();
        assert!(!unchanged.changed);
        let changed = engine.override_prediction(&r, Income::Above50K).unwrap();
        assert!(changed.changed);
        assert_eq!(changed.income, Income::AtMost50K);
        assert_eq!(changed.note, OVERRIDE_NOTE);
    }

    #[test]
    fn test_override_needs_low_capital_gain() {
        let mut r = CensusRecord::young_service_profile();
        r.capital_gain = 1000;
        assert_eq!(FallbackEngine::new().override_prediction(&r, Income::Above50K), None);
    }

    proptest! {
        #[test]
        fn prop_verdict_matches_rule(age in 17i64..90, hours in 1i64..99, gain in 0i64..20_000, male in any::<bool>()) {
            let mut r = base();
            r.age = age;
            r.hours_per_week = hours;
            r.capital_gain = gain;
            r.gender = if male { "Male" } else { "Female" }.to_string();
            let verdict = FallbackEngine::new().predict(&r);
            prop_assert_eq!(verdict.income, verdict.rule.income());
            if gain > 5000 && age >= 25 {
                prop_assert_eq!(verdict.income, Income::Above50K);
            }
        }
    }
}
