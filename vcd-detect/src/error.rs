//! Error types for vcd-detect HTTP handlers
//!
//! Every error response has the shape `{ "error": "<message>" }`. Internal
//! faults never leak their detail to the caller; it is logged instead.

use crate::services::PipelineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message returned for every internal fault
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Pipeline stage failure (500, cause exposed)
    #[error("{0}")]
    Pipeline(String),

    /// Internal server error (500, detail withheld)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        if err.is_internal() {
            ApiError::Internal(err.to_string())
        } else {
            ApiError::Pipeline(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Pipeline(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Internal(detail) => {
                error!(detail = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
