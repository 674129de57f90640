use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Health check endpoint (liveness)
/// Returns 200 while the process is serving, ready or not
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "scholar-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime().as_secs(),
    }))
}

/// Readiness check endpoint
///
/// 200 once the retriever is installed, 503 with the initializer state
/// otherwise. Failure causes stay in the logs.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let ready = state.retrieval.is_ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if ready { "ready" } else { "not_ready" },
            "service": "scholar-server",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptime_seconds": state.uptime().as_secs(),
            "init": state.init_status(),
        })),
    )
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    match &state.metrics {
        Some(handle) => Ok((
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )),
        None => Err(crate::error::ServerError::NotFound),
    }
}
