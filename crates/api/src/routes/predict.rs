//! Prediction Route

use axum::{body::Bytes, extract::State, Json};
use census_data::{CensusRecord, ProfileInput, ValidationError};
use fallback::{Rule, FALLBACK_NOTE};
use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::SharedState;

/// Echo of the inputs that drive the override rule
#[derive(Debug, Serialize)]
pub struct DebugInfo {
    pub input_age: i64,
    pub input_education: String,
    pub input_occupation: String,
    pub input_hours: i64,
    pub input_gender: String,
}

impl From<&CensusRecord> for DebugInfo {
    fn from(record: &CensusRecord) -> Self {
        Self {
            input_age: record.age,
            input_education: record.education.clone(),
            input_occupation: record.occupation.clone(),
            input_hours: record.hours_per_week,
            input_gender: record.gender.clone(),
        }
    }
}

/// Successful `/predict` response
///
/// Model answers carry `probability` and `debug`; rule answers carry `rule`.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub prediction: &'static str,
    /// Model score for `>50K` before the young-worker override, so it can
    /// disagree with `prediction` when `note` reports an adjustment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<Rule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

/// Predict the income class of one profile
///
/// The body is parsed by hand so that malformed JSON gets the same
/// `{"success": false}` shape as every other failure.
pub async fn predict(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| ValidationError::InvalidFormat(e.to_string()))?;
    debug!("Received data: {}", value);
    let record = ProfileInput::from_value(value)?.into_record()?;

    let mut state = state.write().await;
    if !state.engine.refresh()? {
        info!("Model file not found, using demographic rules");
        let verdict = state.fallback.predict(&record);
        state.counters.fallback_predictions += 1;
        counter!("income_predictions_total", "source" => "fallback").increment(1);

        return Ok(Json(PredictResponse {
            success: true,
            prediction: verdict.income.as_str(),
            probability: None,
            rule: Some(verdict.rule),
            debug: None,
            note: Some(FALLBACK_NOTE),
        }));
    }

    let prediction = state.engine.predict(&record)?;
    state.counters.model_predictions += 1;
    counter!("income_predictions_total", "source" => "model").increment(1);

    let mut income = prediction.income;
    let mut note = None;
    if let Some(adjusted) = state.fallback.override_prediction(&record, income) {
        if adjusted.changed {
            state.counters.overrides += 1;
            counter!("income_overrides_total").increment(1);
        }
        income = adjusted.income;
        note = Some(adjusted.note);
    }

    info!(
        "Prediction: {} (p={:.3}{})",
        income,
        prediction.probability,
        if note.is_some() { ", adjusted" } else { "" }
    );
    Ok(Json(PredictResponse {
        success: true,
        prediction: income.as_str(),
        probability: Some(prediction.probability),
        rule: None,
        debug: Some(DebugInfo::from(&record)),
        note,
    }))
}
