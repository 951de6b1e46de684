use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use convertx_core::error::CoreError;
use convertx_replicate::{CredentialPoolError, GenerationError, ReplicateApiError};
use serde_json::json;

use crate::config::ConfigError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`GenerationError`] and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `convertx_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A generation that ended without an image.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A missing resource with a human-readable message.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Storage(msg) | CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Generation outcomes ---
            AppError::Generation(err) => classify_generation_error(err),

            // --- HTTP-specific errors ---
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let retryable = matches!(&self, AppError::Generation(err) if err.is_retryable());

        let body = json!({
            "error": message,
            "code": code,
            "retryable": retryable,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a generation error into an HTTP status, error code, and message.
///
/// - Bad input maps to 400 and revoked access to 403.
/// - Exhausted credentials map to 429 so the client can back off.
/// - Remote failures map to 502, an unreachable remote to 503, and the
///   poll budget running out to 504.
fn classify_generation_error(err: &GenerationError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match err {
        GenerationError::InvalidRequest(msg) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        GenerationError::AccessRevoked => (StatusCode::FORBIDDEN, "ACCESS_REVOKED", message),
        GenerationError::AllCredentialsExhausted { .. } => {
            (StatusCode::TOO_MANY_REQUESTS, "CREDENTIALS_EXHAUSTED", message)
        }
        GenerationError::RemoteError { .. } | GenerationError::UnexpectedPayload(_) => {
            tracing::error!(error = %err, "Generation API error");
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message)
        }
        GenerationError::RemoteFailure { .. } => {
            (StatusCode::BAD_GATEWAY, "GENERATION_FAILED", message)
        }
        GenerationError::NetworkUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE", message)
        }
        GenerationError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "CANCELLED", message),
        GenerationError::Timeout { .. } => {
            (StatusCode::GATEWAY_TIMEOUT, "GENERATION_TIMEOUT", message)
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Failures that prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialPoolError),

    #[error(transparent)]
    Client(#[from] ReplicateApiError),

    #[error("Invalid CORS origin '{origin}'")]
    CorsOrigin { origin: String },

    #[error("Invalid bind address '{0}'")]
    BindAddress(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
