use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use retrieval::RetrievalError;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
///
/// Messages are what callers see; internal causes are logged where they
/// happen and never copied in here.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Search service is not ready, try again later")]
    Unavailable,

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Unavailable => "SERVICE_UNAVAILABLE",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<RetrievalError> for ServerError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::EmptyQuery => {
                ServerError::BadRequest("Query parameter 'q' must not be empty".to_string())
            }
            RetrievalError::Unavailable => ServerError::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_errors_map_to_status_codes() {
        let bad: ServerError = RetrievalError::EmptyQuery.into();
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.error_code(), "BAD_REQUEST");

        let unavailable: ServerError = RetrievalError::Unavailable.into();
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.error_code(), "SERVICE_UNAVAILABLE");
    }
}
