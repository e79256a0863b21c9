//! HTTP error mapping. Every non-2xx response carries `{error, detail}`
//! (see [`scenariod_protocol::ErrorResponse`]).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scenariod_domain::Error as DomainError;
use scenariod_protocol::ErrorResponse;

/// Gateway-level error, wrapping domain errors and adding transport-specific
/// failure modes (timeouts talking to the host) that have no domain
/// equivalent.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("request timed out: {0}")]
    Timeout(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Domain(DomainError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "invalid_input", msg.clone())
            }
            ApiError::Domain(DomainError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "not_found", msg.clone())
            }
            ApiError::Domain(DomainError::PersistenceFailure(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failure", msg.clone())
            }
            ApiError::Domain(DomainError::PolicyViolation(msg)) => {
                (StatusCode::BAD_REQUEST, "policy_violation", msg.clone())
            }
            ApiError::Domain(DomainError::HostCallFailure(msg)) => {
                (StatusCode::BAD_GATEWAY, "host_call_failure", msg.clone())
            }
            ApiError::Domain(DomainError::Io(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "io_error", e.to_string())
            }
            ApiError::Domain(DomainError::Json(e)) => {
                (StatusCode::BAD_REQUEST, "json_error", e.to_string())
            }
            ApiError::Timeout(msg) => {
                (StatusCode::GATEWAY_TIMEOUT, "timeout", msg.clone())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = self.parts();
        tracing::warn!(status = %status, error, detail, "request failed");
        (status, Json(ErrorResponse { error: error.to_string(), detail })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
