use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::review::session::SUBMISSION_CAP;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant is terminal for the current action only; none of them leave
/// a session's accumulated reviews in a different state than before the call.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Submission cap reached for this session.
    #[error("Submission limit of {} reviews reached for this session", SUBMISSION_CAP)]
    SubmissionRejected,

    /// Analyze was triggered before any review was submitted.
    #[error("No reviews submitted yet")]
    EmptyInput,

    /// The model reply contained no usable line.
    #[error("No valid reviews recognized in the model reply")]
    NoValidRecords,

    /// The aggregator was asked to score an empty record set.
    #[error("No data to score")]
    NoData,

    /// The session has no usable model credential.
    #[error("Session is not ready: no model credential configured")]
    SessionNotReady,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code sent in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::SubmissionRejected => "SUBMISSION_REJECTED",
            AppError::EmptyInput => "EMPTY_INPUT",
            AppError::NoValidRecords => "NO_VALID_RECORDS",
            AppError::NoData => "NO_DATA",
            AppError::SessionNotReady => "SESSION_NOT_READY",
            AppError::Conflict(_) => "CONFLICT",
            AppError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::EmptyInput => StatusCode::BAD_REQUEST,
            AppError::SubmissionRejected => StatusCode::TOO_MANY_REQUESTS,
            AppError::NoValidRecords | AppError::NoData => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SessionNotReady => StatusCode::PRECONDITION_FAILED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ModelUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::SubmissionRejected => {
                tracing::warn!("Submission rejected: cap of {SUBMISSION_CAP} reached");
                self.to_string()
            }
            AppError::ModelUnavailable(msg) => {
                tracing::error!("Model error: {msg}");
                self.to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (self.status(), body).into_response()
    }
}
