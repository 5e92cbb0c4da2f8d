//! HTTP handlers for health, queue introspection and episode ingestion.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use memq_core::{EpisodeRequest, QueueError};
use memq_engine::NamespaceStatus;
use serde_json::{json, Value};

use crate::server::AppState;

pub const SERVICE_NAME: &str = "memq";

/// Errors surfaced to HTTP callers. Everything here is a client mistake;
/// failures after enqueue never reach this layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("invalid request body: {0}")]
    Body(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Queue(QueueError::LimiterClosed) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Queue(QueueError::NoRuntime) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Queue(_) | ApiError::Body(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let queue = state.episodes.router().status();
    if queue.total_depth() > 0 {
        tracing::debug!(
            depth = queue.total_depth(),
            active_workers = queue.active_workers(),
            "backlog present"
        );
    }
    Json(json!({ "status": "ok", "service": SERVICE_NAME, "queue": queue }))
}

pub async fn queue(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Json<NamespaceStatus> {
    Json(state.episodes.router().namespace_status(&namespace))
}

pub async fn add_episode(
    State(state): State<AppState>,
    body: Result<Json<EpisodeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::Body(e.body_text()))?;
    let message = state.episodes.add_episode(request)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "message": message }))))
}
