//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
///
/// The body is always `{"error": "...", "code": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client, caught at the HTTP boundary.
    BadRequest(String),
    /// Use-case error.
    Saga(SagaError),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Saga(err) => match err {
                SagaError::Validation(_) => StatusCode::BAD_REQUEST,
                SagaError::Rejected { .. } | SagaError::Precondition(_) => StatusCode::CONFLICT,
                SagaError::NotFound(_) => StatusCode::NOT_FOUND,
                SagaError::Transport(_) => StatusCode::BAD_GATEWAY,
                SagaError::Persistence(_) | SagaError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Saga(err) => match err {
                SagaError::Validation(_) => "validation_error",
                SagaError::Rejected { kind, .. } => kind.as_str(),
                SagaError::Precondition(_) => "invalid_status",
                SagaError::NotFound(_) => "not_found",
                SagaError::Transport(_) => "upstream_error",
                SagaError::Persistence(_) => "persistence_error",
                SagaError::Internal(_) => "internal_error",
            },
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Saga(err) => err.to_string(),
            ApiError::Internal(msg) => msg,
        };

        metrics::counter!("http_errors_total", "code" => code).increment(1);
        if status.is_server_error() {
            tracing::error!(error = %message, code, "request failed");
        } else {
            tracing::debug!(error = %message, code, "request rejected");
        }

        let body = serde_json::json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("use case task failed: {err}"))
    }
}
