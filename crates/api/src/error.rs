//! API Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use census_data::ValidationError;
use inference_engine::InferenceError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body could not be used
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Model could not be loaded or evaluated
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Error in prediction: {}", self);
        }
        let body = json!({
            "success": false,
            "error": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
