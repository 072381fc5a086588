//! Categorical Label Encoding

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Code emitted for a category never seen during fitting
pub const UNSEEN_CODE: f64 = -1.0;

/// Maps category strings to their rank among the sorted fitted classes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    /// Sorted unique classes
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on the observed values
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = values.into_iter().collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    /// Encode one category
    pub fn encode(&self, value: &str) -> f64 {
        match self.classes.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(idx) => idx as f64,
            Err(_) => {
                debug!("Unseen category '{}' encoded as {}", value, UNSEEN_CODE);
                UNSEEN_CODE
            }
        }
    }

    /// Category for a code, if it is one of the fitted classes
    pub fn decode(&self, code: f64) -> Option<&str> {
        if code < 0.0 || code.fract() != 0.0 {
            return None;
        }
        self.classes.get(code as usize).map(String::as_str)
    }

    /// Fitted classes in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sorted_codes() {
        let encoder = LabelEncoder::fit(["Private", "Federal-gov", "Private", "Self-emp"]);
        assert_eq!(encoder.classes(), &["Federal-gov", "Private", "Self-emp"]);
        assert_eq!(encoder.encode("Federal-gov"), 0.0);
        assert_eq!(encoder.encode("Self-emp"), 2.0);
    }

    #[test]
    fn test_unseen_category() {
        let encoder = LabelEncoder::fit(["Male", "Female"]);
        assert_eq!(encoder.encode("Other"), UNSEEN_CODE);
        assert_eq!(encoder.decode(UNSEEN_CODE), None);
    }

    proptest! {
        #[test]
        fn prop_encode_decode(values in proptest::collection::vec("[a-zA-Z-]{1,12}", 1..20)) {
            let encoder = LabelEncoder::fit(values.iter().map(String::as_str));
            for v in &values {
                let code = encoder.encode(v);
                prop_assert!(code >= 0.0);
                prop_assert_eq!(encoder.decode(code), Some(v.as_str()));
            }
        }
    }
}
