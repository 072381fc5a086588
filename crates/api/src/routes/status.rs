//! Status Routes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::SharedState;

/// Response for the model status endpoint
#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub model_exists: bool,
    pub model_path: String,
}

/// Report whether the model file exists
pub async fn model_status(State(state): State<SharedState>) -> Json<ModelStatus> {
    let state = state.read().await;
    Json(ModelStatus {
        model_exists: state.engine.model_exists(),
        model_path: state.engine.model_path().display().to_string(),
    })
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}
