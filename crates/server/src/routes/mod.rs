//! API route handlers
//!
//! - `health`: liveness, readiness and Prometheus metrics
//! - `search`: per-model and merged paper search

pub mod health;
pub mod search;

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use semantic::ModelRole;
use serde_json::json;
use std::sync::Arc;

/// API version and base info (GET /)
///
/// Collection names are reported once the retriever is installed.
///
/// ```json
/// {
///   "name": "Scholar Stream",
///   "version": "0.1.0",
///   "ready": true,
///   "collections": { "base": "research_papers", "custom": "research_papers_custom" },
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let collections = state.retrieval.current().map(|retriever| {
        let mut names = serde_json::Map::new();
        for role in ModelRole::ALL {
            names.insert(
                role.as_str().to_string(),
                json!(retriever.binding(role).collection),
            );
        }
        names
    });

    Ok(Json(json!({
        "name": "Scholar Stream",
        "version": env!("CARGO_PKG_VERSION"),
        "ready": collections.is_some(),
        "collections": collections,
        "endpoints": [
            "/api/search?q=",
            "/api/search/merged?q=",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
