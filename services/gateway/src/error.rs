use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use report::ReportError;
use serde_json::json;
use stream::TransportError;
use thiserror::Error;

pub const REPORT_NOT_FOUND: &str = "Report not found. Generate it first.";
pub const EMPTY_MESSAGE: &str = "FIX message cannot be empty";

/// Central error type for the Gateway application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Ingress input refused before publishing. The body carries the reason
    /// directly as `{"error": <reason>}`.
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<TransportError> for AppError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::InvalidPayload(msg) => AppError::BadRequest(msg),
            other => AppError::ServiceUnavailable(other.to_string()),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::NotFound(_) => AppError::NotFound(REPORT_NOT_FOUND.to_string()),
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code) = match self {
            AppError::Rejected(reason) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": reason }))).into_response();
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!(error = %msg, "Stream unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, msg, "SERVICE_UNAVAILABLE")
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            AppError::InternalError(e) => {
                tracing::error!(error = %e, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": error_message
        }));

        (status, body).into_response()
    }
}
