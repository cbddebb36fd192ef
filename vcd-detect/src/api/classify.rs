//! Classification endpoint
//!
//! `POST /api/classify` with `{ "url": string }` runs one pipeline and
//! answers `{ "label": "AI" | "REAL", "probability": float }`.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::models::ClassificationResult;
use crate::AppState;

/// Request body
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /api/classify
pub async fn classify(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> ApiResult<Json<ClassificationResult>> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(reason = %rejection.body_text(), "Rejected classify request body");
        ApiError::BadRequest("request body must be JSON with a \"url\" field".to_string())
    })?;

    let url = request
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("url is required".to_string()))?;

    match state.pipeline.run(&url).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            state.record_error(format!("{}: {}", err.stage(), err)).await;
            Err(err.into())
        }
    }
}

/// Build classification routes
pub fn classify_routes() -> Router<AppState> {
    Router::new().route("/api/classify", post(classify))
}
