use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clea_batch_core::batch::BatchError;
use clea_batch_core::bucket::BucketError;

use crate::response::ErrorEnvelope;

/// Message returned in place of internal error details.
const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Application-level error type for HTTP handlers.
///
/// Wraps the core batch and bucket errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce the JSON error envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The batch could not be run to completion (spawn failure, timeout).
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// A bucket path could not be resolved or read.
    #[error(transparent)]
    Bucket(#[from] BucketError),

    /// The batch ran but its outcome is a failure; carries the text to report.
    #[error("Batch failed: {0}")]
    BatchFailed(String),

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
        let (status, message) = match self {
            // --- Batch errors ---
            AppError::Batch(err @ (BatchError::Timeout { .. } | BatchError::Spawn { .. })) => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::Batch(BatchError::Io(err)) => {
                tracing::error!(error = %err, "Batch I/O error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
            AppError::BatchFailed(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),

            // --- Bucket errors ---
            AppError::Bucket(err @ (BucketError::Traversal(_) | BucketError::InvalidPath(_))) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::Bucket(err @ BucketError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            AppError::Bucket(BucketError::Io(err)) => {
                tracing::error!(error = %err, "Bucket I/O error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::InternalError(message) => {
                tracing::error!(error = %message, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        ErrorEnvelope::new(message).into_response_with(status)
    }
}

/// Turn a panic caught by `CatchPanicLayer` into a 500 envelope.
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    ErrorEnvelope::new(INTERNAL_ERROR_MESSAGE).into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Fallback for paths no route matches.
pub async fn route_not_found() -> Response {
    ErrorEnvelope::new("Route not found").into_response_with(StatusCode::NOT_FOUND)
}

/// Fallback for a known path requested with an unsupported method.
pub async fn method_not_allowed() -> Response {
    ErrorEnvelope::new("Method not allowed").into_response_with(StatusCode::METHOD_NOT_ALLOWED)
}

/// Replace the bare 408 produced by the request timeout layer with the envelope.
pub async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        tracing::warn!("Request timed out");
        ErrorEnvelope::new("Request timed out").into_response_with(StatusCode::REQUEST_TIMEOUT)
    } else {
        response
    }
}
