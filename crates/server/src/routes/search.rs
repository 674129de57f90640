use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use retrieval::{merge_for_display, QueryResult, RankedHit, MERGE_CAVEAT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query parameters for both search endpoints
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Free-text query
    #[serde(default)]
    pub q: Option<String>,
}

/// `GET /api/search` response
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub data: QueryResult,
}

/// `GET /api/search/merged` response
#[derive(Debug, Serialize, Deserialize)]
pub struct MergedSearchResponse {
    pub query: String,
    pub caveat: String,
    pub results: Vec<RankedHit>,
}

fn required_query(params: Result<Query<SearchParams>, QueryRejection>) -> ServerResult<String> {
    let Query(params) = params.map_err(|rejection| {
        ServerError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    })?;
    match params.q {
        Some(q) if !q.trim().is_empty() => Ok(q),
        Some(_) => Err(ServerError::BadRequest(
            "Query parameter 'q' must not be empty".to_string(),
        )),
        None => Err(ServerError::BadRequest(
            "Missing query parameter 'q'".to_string(),
        )),
    }
}

/// Search both collections; one ranked list per model.
pub async fn search(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ServerResult<impl IntoResponse> {
    let query = required_query(params)?;
    let data = state.retrieval.retrieve(&query).await?;
    Ok(Json(SearchResponse { query, data }))
}

/// Search both collections and return one list ordered by raw score.
pub async fn search_merged(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ServerResult<impl IntoResponse> {
    let query = required_query(params)?;
    let data = state.retrieval.retrieve(&query).await?;
    Ok(Json(MergedSearchResponse {
        results: merge_for_display(&data),
        caveat: MERGE_CAVEAT.to_string(),
        query,
    }))
}
