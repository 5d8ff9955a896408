//! HTTP serving layer.
//!
//! A thin axum front over [`ServiceContext`]: three routes, permissive
//! CORS, JSON in and out. Artifacts are loaded by the binary before the
//! listener binds, so every request served sees a ready context.

use crate::error::PedonError;
use crate::service::{PredictionRequest, PredictionResponse, ServiceContext};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the application router over a ready service context.
#[must_use]
pub fn router(context: Arc<ServiceContext>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/", get(health))
        .route("/predict", post(predict))
        .route("/predict/", post(predict))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

/// Maps a service failure to an HTTP response.
struct ApiError(PedonError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PedonError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "prediction request failed");
        } else {
            tracing::debug!(error = %self.0, "rejected request");
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

impl From<PedonError> for ApiError {
    fn from(err: PedonError) -> Self {
        Self(err)
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "SOC prediction service" }))
}

async fn health(State(context): State<Arc<ServiceContext>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "models_loaded": context.n_models(),
    }))
}

async fn predict(
    State(context): State<Arc<ServiceContext>>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    // Body-level failures (missing field, wrong type, unknown field)
    // surface as validation errors, same as value-level ones.
    let Json(request) = payload
        .map_err(|rejection| PedonError::validation(rejection.body_text()))?;

    let predictions = context.predict(&request)?;
    Ok(Json(PredictionResponse {
        predictions,
        message: "Prediction successful".to_string(),
    }))
}
