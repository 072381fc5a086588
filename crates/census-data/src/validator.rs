//! Prediction Request Validation

use crate::error::ValidationError;
use crate::record::{education_number, CensusRecord};
use serde_json::{Map, Value};
use tracing::debug;

/// Fields a prediction request must carry
pub const REQUIRED_FIELDS: [&str; 10] = [
    "age",
    "workclass",
    "fnlwgt",
    "education",
    "occupation",
    "gender",
    "capital-gain",
    "capital-loss",
    "hours-per-week",
    "native-country",
];

/// Default race when the form omits it
pub const DEFAULT_RACE: &str = "White";
/// Default marital status when the form omits it
pub const DEFAULT_MARITAL_STATUS: &str = "Never-married";
/// Default relationship when the form omits it
pub const DEFAULT_RELATIONSHIP: &str = "Not-in-family";

/// Raw prediction request as posted by the web form
#[derive(Debug, Clone, Default)]
pub struct ProfileInput {
    fields: Map<String, Value>,
}

impl ProfileInput {
    /// Wrap an already parsed JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Accept any JSON value; only objects are valid requests
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(fields) => Ok(Self::new(fields)),
            other => Err(ValidationError::InvalidFormat(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }

    /// Required fields that are absent or null, in declaration order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| self.get(field).is_none())
            .collect()
    }

    /// Validate the request and fill optional fields with their defaults
    pub fn into_record(self) -> Result<CensusRecord, ValidationError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let education = self.text("education")?;
        let educational_num = match self.get("educational-num") {
            Some(_) => self.integer("educational-num")?,
            None => {
                let derived = education_number(&education);
                debug!("Derived educational-num {} from '{}'", derived, education);
                derived
            }
        };

        Ok(CensusRecord {
            age: self.integer("age")?,
            workclass: self.text("workclass")?,
            fnlwgt: self.integer("fnlwgt")?,
            educational_num,
            education,
            marital_status: self.text_or("marital-status", DEFAULT_MARITAL_STATUS)?,
            occupation: self.text("occupation")?,
            relationship: self.text_or("relationship", DEFAULT_RELATIONSHIP)?,
            race: self.text_or("race", DEFAULT_RACE)?,
            gender: self.text("gender")?,
            capital_gain: self.integer("capital-gain")?,
            capital_loss: self.integer("capital-loss")?,
            hours_per_week: self.integer("hours-per-week")?,
            native_country: self.text("native-country")?,
        })
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    fn integer(&self, field: &'static str) -> Result<i64, ValidationError> {
        let value = self.get(field).ok_or(ValidationError::MissingFields(vec![field]))?;
        let invalid = || ValidationError::InvalidValue {
            field,
            value: value.to_string(),
        };
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(i),
                // Floats truncate toward zero
                None => n
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
                    .ok_or_else(invalid),
            },
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    fn text(&self, field: &'static str) -> Result<String, ValidationError> {
        match self.get(field) {
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(other) => Err(ValidationError::InvalidValue {
                field,
                value: other.to_string(),
            }),
            None => Err(ValidationError::MissingFields(vec![field])),
        }
    }

    fn text_or(&self, field: &'static str, default: &str) -> Result<String, ValidationError> {
        if self.get(field).is_some() {
            self.text(field)
        } else {
            Ok(default.to_string())
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_request() -> Value {
        json!({
            "age": 38,
            "workclass": "Private",
            "fnlwgt": 215646,
            "education": "Bachelors",
            "occupation": "Exec-managerial",
            "gender": "Male",
            "capital-gain": 0,
            "capital-loss": 0,
            "hours-per-week": 45,
            "native-country": "United-States"
        })
    }

    #[test]
    fn test_defaults_filled() {
        let record = ProfileInput::from_value(full_request()).unwrap().into_record().unwrap();
        assert_eq!(record.educational_num, 13);
        assert_eq!(record.race, DEFAULT_RACE);
        assert_eq!(record.marital_status, DEFAULT_MARITAL_STATUS);
        assert_eq!(record.relationship, DEFAULT_RELATIONSHIP);
    }

    #[test]
    fn test_explicit_optional_fields_kept() {
        let mut request = full_request();
        request["educational-num"] = json!(15);
        request["race"] = json!("Asian-Pac-Islander");
        let record = ProfileInput::from_value(request).unwrap().into_record().unwrap();
        assert_eq!(record.educational_num, 15);
        assert_eq!(record.race, "Asian-Pac-Islander");
    }

    #[test]
    fn test_missing_fields_listed_in_order() {
        let mut request = full_request();
        let obj = request.as_object_mut().unwrap();
        obj.remove("gender");
        obj.remove("age");
        obj.insert("fnlwgt".to_string(), Value::Null);

        let err = ProfileInput::from_value(request).unwrap().into_record().unwrap_err();
        assert_eq!(err, ValidationError::MissingFields(vec!["age", "fnlwgt", "gender"]));
        assert_eq!(err.to_string(), "Missing required fields: age, fnlwgt, gender");
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let mut request = full_request();
        request["age"] = json!("41");
        request["hours-per-week"] = json!(39.9);
        let record = ProfileInput::from_value(request).unwrap().into_record().unwrap();
        assert_eq!(record.age, 41);
        assert_eq!(record.hours_per_week, 39);
    }

    #[test]
    fn test_invalid_number_rejected() {
        let mut request = full_request();
        request["capital-gain"] = json!("lots");
        let err = ProfileInput::from_value(request).unwrap().into_record().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field: "capital-gain", .. }));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            ProfileInput::from_value(json!([1, 2])),
            Err(ValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_unknown_education_defaults_to_zero() {
        let mut request = full_request();
        request["education"] = json!("Apprenticeship");
        let record = ProfileInput::from_value(request).unwrap().into_record().unwrap();
        assert_eq!(record.educational_num, 0);
    }

    proptest::proptest! {
        #[test]
        fn prop_numeric_forms_agree(n in -100_000i64..100_000) {
            let mut as_number = full_request();
            as_number["fnlwgt"] = json!(n);
            let mut as_text = full_request();
            as_text["fnlwgt"] = json!(format!(" {} ", n));

            let a = ProfileInput::from_value(as_number).unwrap().into_record().unwrap();
            let b = ProfileInput::from_value(as_text).unwrap().into_record().unwrap();
            proptest::prop_assert_eq!(a.fnlwgt, n);
            proptest::prop_assert_eq!(a, b);
        }
    }
}
