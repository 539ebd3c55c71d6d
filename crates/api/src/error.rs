use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use notekernel_core::error::CoreError;
use serde_json::json;

/// Application-level error type for route steps.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `notekernel_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No route is registered for the method and path.
    #[error("No route for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the configured limit.
    #[error("Payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for step return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        AppError::Core(CoreError::Unauthorized(msg.into()))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Core(CoreError::Forbidden(msg.into()))
    }

    pub fn read_only(msg: impl Into<String>) -> Self {
        AppError::Core(CoreError::ReadOnly(msg.into()))
    }

    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                CoreError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                CoreError::ReadOnly(_) => (StatusCode::SERVICE_UNAVAILABLE, "READ_ONLY_MODE"),
                CoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            AppError::RouteNotFound { .. } => (StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            AppError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, key } => format!("{entity} '{key}' not found"),
                CoreError::Validation(msg)
                | CoreError::Conflict(msg)
                | CoreError::Unauthorized(msg)
                | CoreError::Forbidden(msg)
                | CoreError::ReadOnly(msg) => msg.clone(),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    "An internal error occurred".to_string()
                }
            },
            AppError::RouteNotFound { method, path } => format!("No route for {method} {path}"),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::PayloadTooLarge { limit } => {
                format!("Request body exceeds the {limit}-byte limit")
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "An internal error occurred".to_string()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
