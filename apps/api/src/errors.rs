use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::applications::ApplyError;
use crate::db::StoreError;
use crate::ingestion::IngestError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every response body is `{"kind": ..., "message": ...}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            AppError::Ingest(err) => match err {
                IngestError::PayloadTooLarge(msg) => {
                    (StatusCode::BAD_REQUEST, "payload_too_large", msg.clone())
                }
                IngestError::InvalidDocument(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_document", msg.clone())
                }
                IngestError::Unavailable(msg) => {
                    tracing::warn!("Resume parser unavailable: {msg}");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "unavailable",
                        "The resume parsing service is unavailable, try again later".to_string(),
                    )
                }
                IngestError::Storage(msg) => storage_failure(msg),
            },
            AppError::Apply(ApplyError::JobNotFound(job_id)) => (
                StatusCode::NOT_FOUND,
                "job_not_found",
                format!("Job {job_id} not found"),
            ),
            AppError::Apply(ApplyError::Storage(err)) | AppError::Store(err) => {
                storage_failure(&err.to_string())
            }
        }
    }
}

fn storage_failure(detail: &str) -> (StatusCode, &'static str, String) {
    tracing::error!("Storage error: {detail}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "storage_error",
        "A storage error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();
        let body = Json(json!({
            "kind": kind,
            "message": message
        }));

        (status, body).into_response()
    }
}
